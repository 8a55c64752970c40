use std::{sync::Arc, time::Instant};

use anyhow::Context;
use camera_controller::{
    bluetooth::{BluerTransport, PasskeyRequest},
    camera::Camera,
    config::{Args, ControllerConfig},
    connection::{CameraConnection, ConnectionStatus},
    console::{self, HELP, Intent},
};
use clap::Parser;
use log::{debug, info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

type Connection = Arc<CameraConnection<BluerTransport>>;

/// Starts scans and connection attempts while the link is down.
struct Reconnect {
    last_attempt: Option<Instant>,
    attempt: Option<JoinHandle<()>>,
}

impl Reconnect {
    fn busy(&self) -> bool {
        self.attempt.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn tick(&mut self, connection: &Connection, config: &ControllerConfig) {
        if self.busy() {
            return;
        }
        let due = self
            .last_attempt
            .is_none_or(|at| at.elapsed() >= config.reconnect_interval);
        let connection = connection.clone();
        let attempt = match connection.status() {
            ConnectionStatus::ScanningFound => tokio::spawn(async move {
                let _ = connection.connect_discovered().await;
            }),
            status if status.is_idle() && due => {
                self.last_attempt = Some(Instant::now());
                match config.address {
                    Some(address) => tokio::spawn(async move {
                        let _ = connection.connect(address).await;
                    }),
                    None => {
                        let window = config.scan_window;
                        tokio::spawn(async move {
                            let _ = connection.scan(window).await;
                        })
                    }
                }
            }
            _ => return,
        };
        self.attempt = Some(attempt);
    }
}

async fn run(config: ControllerConfig) -> anyhow::Result<()> {
    let (passkey_tx, mut passkey_rx) = mpsc::unbounded_channel::<PasskeyRequest>();
    let transport = BluerTransport::new(&config.device_name, passkey_tx)
        .await
        .context("Bluetooth is not available")?;
    let connection: Connection = Arc::new(CameraConnection::new(transport, Camera::new()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(config.poll_interval);
    let mut reconnect = Reconnect {
        last_attempt: None,
        attempt: None,
    };
    let mut passkey: Option<oneshot::Sender<u32>> = None;
    let mut seen_revision = 0;
    println!("Type `help` for commands");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            _ = tick.tick() => {
                reconnect.tick(&connection, &config);
                let revision = connection.camera().revision();
                if revision != seen_revision {
                    debug!("camera state revision {revision}");
                    seen_revision = revision;
                }
            }

            Some(request) = passkey_rx.recv() => {
                println!("Enter the pass key shown on camera {}:", request.camera);
                passkey = Some(request.reply);
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Some(reply) = passkey.take() {
                    match line.trim().parse() {
                        Ok(key) => {
                            let _ = reply.send(key);
                        }
                        Err(_) => {
                            println!("Pass keys are six digits, try again:");
                            passkey = Some(reply);
                        }
                    }
                } else {
                    match console::parse(&line) {
                        Ok(Intent::Quit) => break,
                        Ok(Intent::Help) => println!("{HELP}"),
                        Ok(Intent::Status) => print!(
                            "{}",
                            console::describe(connection.status(), &connection.camera().snapshot())
                        ),
                        Ok(Intent::Camera(setting)) => {
                            if let Err(e) = setting.send(&connection.writer()).await {
                                println!("{e}");
                            }
                        }
                        Err(e) => println!("{e}"),
                    }
                }
            }
        }
    }

    info!("Shutting down");
    if let Err(e) = connection.disconnect().await {
        warn!("Disconnect failed: {e}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = ControllerConfig::from(Args::parse());
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(config))
}
