use clap::Parser;
use miette::Result;
use staymap::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) so piping into
    // `head` does not panic on a broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Inspect(args) => staymap::cli::commands::inspect::run(args, &global),
        Commands::Suggest(args) => staymap::cli::commands::suggest::run(args, &global),
        Commands::Map(args) => staymap::cli::commands::map::run(args, &global),
        Commands::Import(args) => staymap::cli::commands::import::run(args, &global),
        Commands::Webhook(args) => staymap::cli::commands::webhook::run(args, &global),
        Commands::Config(cmd) => staymap::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => staymap::cli::commands::completions::run(args),
    }
}

/// Log to stderr; `STAYMAP_LOG` takes precedence over `-v`/`-q`
fn init_logging(global: &GlobalOpts) {
    let default_level = if global.verbose {
        "staymap=debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("STAYMAP_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
