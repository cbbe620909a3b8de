//! Plain aligned tables for `--format table`.

#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Narrowest a column is ever squeezed to.
const MIN_COLUMN: usize = 4;

/// Render an aligned table of string rows. Missing cells print as `-`.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count())
                .max(MIN_COLUMN)
        })
        .collect();
    shrink_to_fit(&mut widths, headers, options.max_width);

    let header_line = join_cells(headers.iter().zip(&widths).map(|(header, width)| {
        pad(&clip(&header.to_ascii_uppercase(), *width), *width, false)
    }));
    let divider = "-".repeat(header_line.chars().count());

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(header_line);
    lines.push(divider);
    for row in rows {
        lines.push(join_cells(widths.iter().enumerate().map(|(index, width)| {
            let cell = clip(row.get(index).map_or("-", String::as_str), *width);
            let padded = pad(&cell, *width, is_numeric(&cell));
            if options.color {
                paint(&cell, padded)
            } else {
                padded
            }
        })));
    }
    lines.join("\n")
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    cells.collect::<Vec<_>>().join("  ").trim_end().to_string()
}

/// Take one column at a time off the widest shrinkable column until the
/// table fits, never going below the header width.
fn shrink_to_fit(widths: &mut [usize], headers: &[&str], max_width: Option<usize>) {
    let Some(max_width) = max_width else {
        return;
    };
    let separators = widths.len().saturating_sub(1) * 2;
    while widths.iter().sum::<usize>() + separators > max_width {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(idx, width)| **width > headers[*idx].len().max(MIN_COLUMN))
            .max_by_key(|(_, width)| **width)
            .map(|(idx, _)| idx);
        let Some(idx) = widest else {
            break;
        };
        widths[idx] -= 1;
    }
}

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(value.chars().count()));
    if right_align {
        format!("{fill}{value}")
    } else {
        format!("{value}{fill}")
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

/// Color change kinds and requirement statuses; `padded` keeps its padding
/// outside the escape codes so alignment holds.
fn paint(cell: &str, padded: String) -> String {
    let code = match cell.to_ascii_lowercase().as_str() {
        "created" | "done" | "verified" | "true" => "32",
        "updated" | "draft" | "in_progress" | "pending" => "33",
        "deleted" | "blocked" | "false" => "31",
        "scope" => "1",
        _ => return padded,
    };
    padded.replacen(cell, &format!("\u{1b}[{code}m{cell}\u{1b}[0m"), 1)
}

#[cfg(test)]
mod tests {
    use super::{TableOptions, render_table};

    const PLAIN: TableOptions = TableOptions {
        max_width: None,
        color: false,
    };

    #[test]
    fn columns_align_across_rows() {
        let rows = vec![
            vec!["SCOPE-1".to_string(), "Accounts".to_string()],
            vec!["SCOPE-1-US-12".to_string(), "Sign up".to_string()],
        ];
        let table = render_table(&["key", "title"], &rows, PLAIN);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "KEY            TITLE");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2].find("Accounts"), lines[3].find("Sign up"));
    }

    #[test]
    fn missing_cells_print_a_dash() {
        let rows = vec![vec!["SCOPE-1".to_string()]];
        let table = render_table(&["key", "status"], &rows, PLAIN);
        assert!(table.lines().nth(2).is_some_and(|line| line.ends_with('-')));
    }

    #[test]
    fn narrow_terminals_clip_the_widest_column() {
        let rows = vec![vec!["SCOPE-1".to_string(), "x".repeat(80)]];
        let table = render_table(
            &["key", "title"],
            &rows,
            TableOptions {
                max_width: Some(40),
                color: false,
            },
        );
        let row = table.lines().nth(2).unwrap_or_default();
        assert_eq!(row.chars().count(), 40);
        assert!(row.ends_with('…'));
    }

    #[test]
    fn color_wraps_known_values_only() {
        let rows = vec![vec!["created".to_string(), "SCOPE-1".to_string()]];
        let table = render_table(
            &["change", "key"],
            &rows,
            TableOptions {
                max_width: None,
                color: true,
            },
        );
        let row = table.lines().nth(2).unwrap_or_default();
        assert!(row.starts_with("\u{1b}[32mcreated\u{1b}[0m"));
        assert!(!row.contains("\u{1b}[0mSCOPE"));
    }
}
