use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::{self, AppContext};

/// Run a parsed command.
///
/// `schema` only describes types, so it runs before configuration is loaded
/// and never opens the store.
pub async fn dispatch(command: Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    if let Commands::Schema(args) = &command {
        return commands::schema::handle(args, flags);
    }

    let config = bootstrap::load_config()?;
    context::warn_unconfigured(&config);
    let ctx = AppContext::init(config, flags.db.as_deref()).await?;
    dispatch_with_store(command, &ctx, flags).await
}

async fn dispatch_with_store(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Import(args) => commands::import::handle(&args, ctx, flags).await,
        Commands::Export(args) => commands::export::handle(&args, ctx, flags).await,
        Commands::Projects => commands::projects::handle(ctx, flags).await,
        Commands::Status(args) => commands::status::handle(&args, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
        Commands::NextKey(args) => commands::next_key::handle(&args, ctx, flags).await,
        Commands::Create(args) => commands::create::handle(&args, ctx, flags).await,
        Commands::Update(args) => commands::update::handle(&args, ctx, flags).await,
        Commands::List(args) => commands::list::handle(&args, ctx, flags).await,
        Commands::Show(args) => commands::show::handle(&args, ctx, flags).await,
        Commands::Delete(args) => commands::delete::handle(&args, ctx, flags).await,
        Commands::DeleteProject(args) => {
            commands::delete_project::handle(&args, ctx, flags).await
        }
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}
