use std::{error::Error, net::SocketAddr, process, sync::Arc, time::Duration};

use clap::{command, Parser, ValueHint};
use log::{debug, error, info, warn, LevelFilter};
use tokio::{net::TcpListener, sync::oneshot};

use nowplaying_relay::{
    auth, callback,
    config::{Config, Settings},
    detector::CommitPolicy,
    http::Client as HttpClient,
    messenger::MessageTarget,
    signal,
    spotify::Spotify,
    store::TokenStore,
    supervisor::Supervisor,
    telegram::Telegram,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when built in release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    ///
    /// Holds the Spotify client credentials and the Telegram bot token. Keep
    /// it private.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value_t = String::from("config.toml"), env = "NOWPLAYING_CONFIG")]
    config: String,

    /// Token file
    ///
    /// Where the Spotify access token is kept between runs. Created on first
    /// start if missing.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value_t = String::from("token.json"), env = "NOWPLAYING_TOKEN_FILE")]
    token_file: String,

    /// Address of the authorization callback server
    #[arg(short, long, value_name = "ADDR", default_value = "127.0.0.1:3000", env = "NOWPLAYING_LISTEN")]
    listen: SocketAddr,

    /// Seconds between now-playing polls
    #[arg(long, value_name = "SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Seconds between token validity checks
    #[arg(long, value_name = "SECS", default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
    validate_interval: u64,

    /// Milliseconds between the photo and caption edits
    #[arg(long, value_name = "MS", default_value_t = 1500)]
    settle_delay: u64,

    /// Seconds before an HTTP request is abandoned
    #[arg(long, value_name = "SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout: u64,

    /// Retry a failed publish on the next poll
    ///
    /// By default a track whose message update failed is skipped until the
    /// next track starts.
    #[arg(long, default_value_t = false)]
    retry_failed_publish: bool,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            poll_interval: Duration::from_secs(self.poll_interval),
            validate_interval: Duration::from_secs(self.validate_interval),
            settle_delay: Duration::from_millis(self.settle_delay),
            request_timeout: Duration::from_secs(self.request_timeout),
            commit_policy: if self.retry_failed_publish {
                CommitPolicy::AfterSuccess
            } else {
                CommitPolicy::BeforePublish
            },
        }
    }
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            0 => {
                // Quiet and verbose are mutually exclusive, and `verbose` is 0
                // by default. So this arm means: quiet mode.
                LevelFilter::Warn
            }
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Runs the relay until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error when the configuration is unusable, the listen address
/// cannot be bound, or the callback server fails.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = Config::from_file(&args.config)?;
    let settings = args.settings();
    debug!("{settings:?}");

    let http_client = HttpClient::new(&config, settings.request_timeout)?;
    let spotify = Arc::new(Spotify::new(&config, http_client.clone()));
    let telegram = Arc::new(Telegram::new(&config, http_client));
    let target = MessageTarget {
        chat_id: config.telegram.channel_id.clone(),
        message_id: config.telegram.message_id,
    };

    let authorize_url = auth::authorize_url(&config.spotify)?;
    let listener = TcpListener::bind(args.listen).await?;
    info!("authorize at http://{}/", args.listen);

    let (supervisor, handle) = Supervisor::new(
        spotify,
        telegram,
        TokenStore::new(&args.token_file),
        target,
        settings,
    );
    let supervisor = tokio::spawn(supervisor.run());

    let (stop, stopped) = oneshot::channel::<()>();
    let router = callback::router(handle.clone(), authorize_url);
    let mut server = tokio::spawn(callback::serve(listener, router, async {
        let _ = stopped.await;
    }));

    let mut signals = signal::Handler::new()?;
    loop {
        tokio::select! {
            received = signals.recv() => {
                if received.is_shutdown() {
                    info!("received {received}; shutting down gracefully");
                    break;
                }

                info!("received {received}; checking token");
                handle.revalidate().await?;
            }

            result = &mut server => {
                handle.shutdown().await;
                result??;
                return Err("callback server stopped unexpectedly".into());
            }
        }
    }

    handle.shutdown().await;
    let _ = stop.send(());
    if let Err(e) = server.await? {
        warn!("callback server: {e}");
    }
    supervisor.await?;

    Ok(())
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and starts the relay.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
