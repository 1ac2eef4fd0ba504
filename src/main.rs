use clap::{Parser, Subcommand, Args};
use holograph_session::DEFAULT_SERVER_ADRESS;

/// # Global Arguments
#[derive(Debug, Parser)]
#[command(version, about = "Shared holographic graph session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run session relay
    Server(ServerArgs),

    /// Join a session as a headless participant
    Participant(ParticipantArgs),
}

#[derive(Debug, Args)]
struct ServerArgs {
    /// Relay address
    #[arg(short = 'a', long = "address", value_name = "SERVER_ADDRESS", default_value_t = String::from(DEFAULT_SERVER_ADRESS))]
    address: String,
}

#[derive(Debug, Args)]
struct ParticipantArgs {
    /// Relay address
    #[arg(short = 'a', long = "address", value_name = "SERVER_ADDRESS", default_value_t = String::from(DEFAULT_SERVER_ADRESS))]
    address: String,

    /// Menu layout JSON, built-in hexagonal layout when omitted
    #[arg(short = 'm', long = "menu", value_name = "MENU_JSON")]
    menu: Option<std::path::PathBuf>,

    /// Menu action clicked once the session is joined
    #[arg(short = 'c', long = "click", value_name = "ACTION")]
    click: Option<String>,

    /// Announce this participant as the presenter
    #[arg(long = "presenter", default_value_t = false)]
    presenter: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .format_file(false)
        .format_line_number(true)
        .init();

    let cli_args = Cli::parse();
    log::info!("Got args: '{:?}'.", cli_args);

    let result = match cli_args.mode {
        Mode::Server(server_args) => {
            cli_server::run(&server_args.address)
        },
        Mode::Participant(participant_args) => {
            cli_participant::run(participant_args)
        },
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("IoError, reason='{0}'")]
    IoError(#[from] std::io::Error),

    #[error("Relay failed, reason='{0}'")]
    Relay(#[from] holograph_session::app::server::RelayServerError),

    #[error("Transport failed, reason='{0}'")]
    Transport(#[from] holograph_session::app::client::TransportError),

    #[error("Menu config rejected, reason='{0}'")]
    Config(#[from] holograph_session::menu::config::ConfigError),

    #[error("Could not set Ctrl-C handler, reason='{0}'")]
    Ctrlc(#[from] ctrlc::Error),
}

mod cli_server {
    use holograph_session::app::server::RelayServer;

    use super::CliError;

    pub fn run<A: tokio::net::ToSocketAddrs>(addr: A) -> Result<(), CliError> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            let server = RelayServer::bind(addr).await?;
            log::info!("Relay, address:{:?}", server.get_local_address()?);

            let server_handler = server.run().await?;

            let (ctrlc_sender, ctrlc_receiver) = tokio::sync::oneshot::channel();
            let mut ctrlc_sender = Some(ctrlc_sender);

            ctrlc::set_handler(move || {
                log::info!("Captured ctrl-C, shutting down the relay...");
                if let Some(sndr) = ctrlc_sender.take() {
                    let _ = sndr.send(());
                }
            })?;

            if ctrlc_receiver.await.is_err() {
                log::warn!("Ctrl-C handler dropped");
            }
            server_handler.shutdown().await?;
            Ok(())
        })
    }
}

mod cli_participant {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc
        },
        time::Duration
    };

    use holograph_session::{
        app::client::TcpTransport,
        math::{Quaternion, Transform, Vector3F},
        menu::{
            config::MenuConfig,
            nodes::{NodeGraph, NodeInfo},
            MenuController,
            StoryLog
        },
        session::{
            head_manager::HeadManager,
            host::SessionHost,
            presenter::Billboard,
            transport::Transport
        }
    };

    use super::{CliError, ParticipantArgs};

    const TICK_INTERVAL: Duration = Duration::from_millis(32);

    /// Slow orbit so remote peers see the head move.
    fn viewpoint_at(elapsed: f32) -> Transform {
        let position = Vector3F::new(elapsed.cos() * 0.5, 1.6, elapsed.sin() * 0.5);
        let rotation = Quaternion::from_axis_angle(Vector3F::new(0.0, 1.0, 0.0), elapsed * 0.25);
        Transform::new(position, rotation)
    }

    pub fn run(args: ParticipantArgs) -> Result<(), CliError> {
        let config = match &args.menu {
            Some(path) => MenuConfig::from_path(path)?,
            None => MenuConfig::hexagonal_default(),
        };

        let mut graph = NodeGraph::new();
        let handle = graph.add(
            NodeInfo::new("Pump station", "Supplies the eastern district")
                .with_property("Status", "Nominal")
        );
        let node = graph.get(handle).cloned().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "graph node vanished")
        })?;
        let menu = MenuController::new(&config, &node, Box::new(StoryLog::new()))?;

        let running = Arc::new(AtomicBool::new(true));
        let running_shared = running.clone();
        ctrlc::set_handler(move || {
            log::info!("Captured ctrl-C, leaving the session...");
            running_shared.store(false, Ordering::SeqCst);
        })?;

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async move {
            let transport = TcpTransport::connect(&args.address).await?;

            let heads = HeadManager::new(
                Transform::identity(),
                vec![Billboard::new("InfoPanel"), Billboard::new("StoryPanel")]
            );
            let mut host = SessionHost::new(transport, heads).with_menu(menu);
            host.initialize();

            let mut pending_click = args.click.clone();
            let mut pending_presenter = args.presenter;
            let started = std::time::Instant::now();

            while running.load(Ordering::SeqCst) {
                let viewpoint = viewpoint_at(started.elapsed().as_secs_f32());
                host.tick(&viewpoint);

                if host.transport().is_connected() {
                    if let Some(action) = pending_click.take() {
                        click_by_action(&mut host, &action);
                    }
                    if pending_presenter {
                        pending_presenter = false;
                        if let Some(local_id) = host.transport().local_participant_id() {
                            let target = host.announce_presenter(local_id);
                            log::info!("Announced presenter {local_id}, billboards face {target:?}");
                        }
                    }
                }

                tokio::time::sleep(TICK_INTERVAL).await;
            }

            log::info!(
                "Leaving session with {} remote participants",
                host.heads().registry().len()
            );
            host.shutdown();
            host.into_transport().disconnect().await;
            Ok(())
        })
    }

    fn click_by_action(host: &mut SessionHost<TcpTransport>, action: &str) {
        let index = host.menu().and_then(|menu| {
            menu.buttons().iter().position(|button| button.action_name == action)
        });

        match index {
            Some(index) => match host.click_menu_button(index) {
                Ok(()) => log::info!("Clicked {action}"),
                Err(e) => log::warn!("Click on {action} failed: {e}"),
            },
            None => log::warn!("No menu button bound to {action}"),
        }
    }
}
