//! roomba-sim: drives a simulated robot through a full session.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  LocalExecutor (one thread)                  │
//! │                                                              │
//! │  tick task ──▶ SimulatedRobot ──▶ TelemetryFeed ──▶ EventBus │
//! │                      ▲                                 │     │
//! │                      │ TransportPort                   ▼     │
//! │  session ──▶ RoombaService                     event task    │
//! │  connect · start · clean_rooms · return_to_base · shutdown   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `RUST_LOG=debug roomba-sim` shows every telemetry notification.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use edge_executor::LocalExecutor;
use futures_lite::future;
use log::{info, warn};

use roombalink::adapters::log_sink::LogEventSink;
use roombalink::adapters::sim_transport::{SIM_MAP_ID, SimulatedRobot};
use roombalink::adapters::time::SystemClock;
use roombalink::app::commands::{AppCommand, Region};
use roombalink::app::ports::EventSink;
use roombalink::app::service::RoombaService;
use roombalink::config::{Password, SessionConfig};
use roombalink::interpreter::LifecycleState;
use roombalink::telemetry::{NotificationFilter, TelemetryFeed};
use roombalink::teardown::Teardown;

/// Simulated robot ticks (one simulated minute each).
const TICK: Duration = Duration::from_millis(150);

type Service = RoombaService<Arc<SimulatedRobot>, SystemClock>;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("roomba-sim v{}", env!("CARGO_PKG_VERSION"));

    let mut config = SessionConfig::new("sim.local", "3145C0FFEE", Password::new("simulated"));
    config.connect_timeout_ms = 3_000;
    config.poll_interval_ms = 100;
    config.dock_wait_attempts = 10;

    let feed = TelemetryFeed::new();
    let robot = Arc::new(SimulatedRobot::new("Simba", feed.clone()));
    let service: Service = RoombaService::new(config, Arc::clone(&robot), feed, SystemClock)?;

    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
    let teardown = service.connection().teardown();

    executor.spawn(tick_loop(&robot, teardown)).detach();
    executor.spawn(event_loop(&service, teardown)).detach();

    future::block_on(executor.run(session(&service)))
}

/// Advance the robot model until the session is torn down.
async fn tick_loop(robot: &SimulatedRobot, teardown: &Teardown) {
    loop {
        robot.tick();
        if !teardown.sleep(TICK).await {
            break;
        }
    }
}

/// Forward vacuum notifications to the log sink.
async fn event_loop(service: &Service, teardown: &Teardown) {
    let mut sub = match service.subscribe(NotificationFilter::Vacuum) {
        Ok(sub) => sub,
        Err(e) => {
            warn!("event log disabled: {}", e);
            return;
        }
    };
    let mut sink = LogEventSink::new(service.connection().config().unique_id());
    loop {
        let next = future::or(async { Some(sub.next().await) }, async {
            teardown.wait().await;
            None
        })
        .await;
        match next {
            Some(event) => sink.emit(&event),
            None => break,
        }
    }
}

async fn wait_for(service: &Service, target: LifecycleState, polls: u32) -> bool {
    let teardown = service.connection().teardown();
    let interval = service.connection().config().poll_interval();
    for _ in 0..polls {
        if service.state() == target {
            return true;
        }
        if !teardown.sleep(interval).await {
            return false;
        }
    }
    service.state() == target
}

async fn session(service: &Service) -> Result<()> {
    let name = service.connect().await?;
    info!("session up with {:?}: {:?}", name, service.device_info());

    service.handle_command(AppCommand::Start).await?;
    wait_for(service, LifecycleState::Cleaning, 5).await;
    service.connection().teardown().sleep(TICK * 6).await;

    let stats = service.statistics();
    info!("lifetime totals: {:?}", stats.totals);
    info!("current job: {:?}", stats.current_job);

    service.handle_command(AppCommand::Pause).await?;
    wait_for(service, LifecycleState::Paused, 5).await;

    let rejected = service
        .handle_command(AppCommand::CleanRooms {
            map_id: Some(SIM_MAP_ID.to_owned()),
            regions: vec![Region::room("42")],
        })
        .await;
    if let Err(e) = rejected {
        info!("expected rejection: {}", e);
    }

    service
        .handle_command(AppCommand::CleanRooms {
            map_id: Some(SIM_MAP_ID.to_owned()),
            regions: vec![Region::room("2"), Region::zone("5")],
        })
        .await?;
    service.connection().teardown().sleep(TICK * 4).await;

    service.handle_command(AppCommand::ReturnToBase).await?;
    if wait_for(service, LifecycleState::Docked, 40).await {
        info!("robot docked, battery {:?}", service.battery());
    } else {
        warn!("robot did not dock in time, state {}", service.state());
    }

    let attributes = serde_json::to_string_pretty(&service.attributes().to_map())?;
    info!("attributes:\n{}", attributes);
    info!("bin full: {:?}, clean base: {:?}", service.bin_full(), service.clean_base());

    service.shutdown().await;
    Ok(())
}
