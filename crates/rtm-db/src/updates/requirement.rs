//! Requirement update builder.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RequirementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
}

impl RequirementUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.acceptance_criteria.is_none()
    }
}

#[derive(Debug, Default)]
pub struct RequirementUpdateBuilder(RequirementUpdate);

impl RequirementUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(RequirementUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn category(mut self, category: Option<String>) -> Self {
        self.0.category = Some(category);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Option<String>) -> Self {
        self.0.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn status(mut self, status: Option<String>) -> Self {
        self.0.status = Some(status);
        self
    }

    #[must_use]
    pub fn acceptance_criteria(mut self, criteria: Vec<String>) -> Self {
        self.0.acceptance_criteria = Some(criteria);
        self
    }

    #[must_use]
    pub fn build(self) -> RequirementUpdate {
        self.0
    }
}
