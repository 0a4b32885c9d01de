use anyhow::{Context, Result};
use officesync::broadcast::BroadcastHub;
use officesync::clock::system_clock;
use officesync::config::{load_config, OfficeConfig};
use officesync::link::ShareLink;
use officesync::roster::AgentStatus;
use officesync::spatial::{avatar_box, find_valid_spot_around};
use officesync::storage::open_store;
use officesync::sync::{spawn_context, LocalAction};
use std::time::Duration;
use tracing::{error, info};

/// How long to wait for the two contexts to agree
const CONVERGE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "officesync=info".into()),
        )
        .init();

    info!("Officesync starting...");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("OFFICESYNC_CONFIG").ok());
    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => OfficeConfig::default(),
    }
    .with_env_overrides();

    let store = open_store(&config.storage)?;
    let hub = BroadcastHub::new(config.sync.channel_capacity);
    let clock = system_clock();

    let first = spawn_context(
        &config.sync,
        ShareLink::parse("/office"),
        store.clone(),
        Some(&hub),
        clock.clone(),
    );
    info!(room_id = %first.room_id(), link = %first.view().share_link, "First context joined");

    // Second context opens the link the first one would share
    let second = spawn_context(
        &config.sync,
        ShareLink::parse(&first.view().share_link),
        store.clone(),
        Some(&hub),
        clock,
    );
    info!(
        room_id = %second.room_id(),
        context_id = %second.context_id(),
        "Second context joined"
    );

    // Seat both avatars near the middle of the floor without overlapping
    let world = config.world.size();
    let first_spot = find_valid_spot_around(world.width / 2.0, world.height / 2.0, &[], world);
    let second_spot = find_valid_spot_around(
        first_spot.x,
        first_spot.y,
        &[avatar_box(first_spot.x, first_spot.y)],
        world,
    );
    info!(
        first = ?(first_spot.x, first_spot.y),
        second = ?(second_spot.x, second_spot.y),
        "Avatars placed"
    );

    first
        .dispatch(LocalAction::SetStatus {
            agent_id: "ops-01".to_string(),
            status: AgentStatus::Offline,
        })
        .await?;
    first
        .dispatch(LocalAction::SelectAgent("qa-07".to_string()))
        .await?;

    let converged = tokio::time::timeout(CONVERGE_TIMEOUT, async {
        second
            .wait_for(|view| {
                view.selected_agent_id == "qa-07"
                    && view.status_of("ops-01") == Some(AgentStatus::Offline)
            })
            .await?;

        second
            .dispatch(LocalAction::CycleStatus("be-03".to_string()))
            .await?;
        let target = second
            .wait_for(|view| view.status_of("be-03") == Some(AgentStatus::Focus))
            .await?;

        first
            .wait_for(|view| view.statuses() == target.statuses())
            .await
    })
    .await;

    match converged {
        Ok(Ok(view)) => info!(
            updated_at = view.updated_at,
            selected = %view.selected_agent_id,
            mode = %view.sync_mode,
            "Contexts converged"
        ),
        Ok(Err(e)) => error!(error = %e, "Context stopped before converging"),
        Err(_) => error!("Contexts did not converge in time"),
    }

    for view in [first.view(), second.view()] {
        for agent in &view.agents {
            info!(
                context_id = %view.context_id,
                agent = %agent.id,
                status = %agent.status.label(),
                "Agent status"
            );
        }
    }

    first.shutdown().await.context("Failed to stop first context")?;
    second.shutdown().await.context("Failed to stop second context")?;

    info!("Officesync stopped");
    Ok(())
}
