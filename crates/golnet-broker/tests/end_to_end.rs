//! End-to-end tests: real worker servers, a real broker server, and the
//! RPC client, all on `127.0.0.1` with ephemeral ports.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use golnet_broker::{BrokerConfig, ListenConfig, RunningBroker, spawn_broker};
use golnet_proto::methods::{
    BrokerPause, BrokerQuit, BrokerReport, BrokerRun, BrokerSave, BrokerShutdown, PauseRequest,
    QuitRequest, ReportRequest, RunRequest, RunResponse, SaveRequest, ShutdownRequest,
};
use golnet_proto::{RpcClient, RpcError};
use golnet_types::{Grid, World, step_grid};
use golnet_worker::{RunningWorker, WorkerConfig, spawn_worker};
use tokio::task::JoinHandle;

/// Turn count large enough that a run never finishes on its own in a test.
const ENDLESS: u64 = 1_000_000;

async fn start_workers(count: usize) -> Vec<RunningWorker> {
    let mut workers = Vec::with_capacity(count);
    for _ in 0..count {
        let config = WorkerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        };
        workers.push(spawn_worker(&config).await.unwrap());
    }
    workers
}

async fn start_broker(worker_addrs: Vec<String>) -> (RunningBroker, RpcClient) {
    let config = BrokerConfig {
        listen: ListenConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        },
        workers: worker_addrs,
        shutdown_grace_ms: 500,
    };
    let broker = spawn_broker(&config).await.unwrap();
    let client = RpcClient::new(broker.addr.to_string());
    (broker, client)
}

async fn start_cluster(workers: usize) -> (Vec<RunningWorker>, RunningBroker, RpcClient) {
    let running = start_workers(workers).await;
    let addrs = running.iter().map(|w| w.addr.to_string()).collect();
    let (broker, client) = start_broker(addrs).await;
    (running, broker, client)
}

fn glider_4x4() -> Grid {
    Grid::from_alive(4, 4, &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)])
}

/// A busy 48x48 pattern that keeps changing for many generations.
fn busy_grid() -> Grid {
    let alive: Vec<(usize, usize)> = (0..48)
        .flat_map(|y| (0..48).map(move |x| (x, y)))
        .filter(|&(x, y)| (x * 7 + y * 13) % 5 == 0 || (x ^ y) % 7 == 1)
        .collect();
    Grid::from_alive(48, 48, &alive)
}

fn spawn_run(
    client: &RpcClient,
    turns: u64,
    world: World,
) -> JoinHandle<Result<RunResponse, RpcError>> {
    let client = client.clone();
    tokio::spawn(async move { client.call::<BrokerRun>(&RunRequest { turns, world }).await })
}

async fn report_turns(client: &RpcClient) -> u64 {
    client.call::<BrokerReport>(&ReportRequest {}).await.unwrap().turns
}

async fn wait_for_turns(client: &RpcClient, at_least: u64) -> u64 {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let turns = report_turns(client).await;
            if turns >= at_least {
                return turns;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn all_dead_grid_single_worker() {
    let (_workers, _broker, client) = start_cluster(1).await;

    let response = client
        .call::<BrokerRun>(&RunRequest {
            turns: 1,
            world: World::new(Grid::new(4, 4), 1),
        })
        .await
        .unwrap();

    assert_eq!(response.turns, 1);
    assert_eq!(response.world.alive_count(), 0);
    assert_eq!(response.world.height, 4);
    assert_eq!(response.world.width, 4);
}

#[tokio::test]
async fn glider_on_two_workers_matches_reference() {
    let (_workers, _broker, client) = start_cluster(2).await;

    let response = client
        .call::<BrokerRun>(&RunRequest {
            turns: 1,
            world: World::new(glider_4x4(), 2),
        })
        .await
        .unwrap();

    assert_eq!(response.turns, 1);
    assert_eq!(response.world.field, step_grid(&glider_4x4()).unwrap());
}

#[tokio::test]
async fn many_turns_on_uneven_bands_match_reference() {
    let (_workers, _broker, client) = start_cluster(3).await;
    let grid = busy_grid();

    let response = client
        .call::<BrokerRun>(&RunRequest {
            turns: 10,
            world: World::new(grid.clone(), 3),
        })
        .await
        .unwrap();

    let mut expected = grid;
    for _ in 0..10 {
        expected = step_grid(&expected).unwrap();
    }
    assert_eq!(response.world.field, expected);

    let saved = client.call::<BrokerSave>(&SaveRequest {}).await.unwrap();
    assert_eq!(saved.turns, 10);
    assert_eq!(saved.world.field, expected);
}

#[tokio::test]
async fn pause_halts_progress_until_resume() {
    let (_workers, _broker, client) = start_cluster(2).await;
    let run = spawn_run(&client, ENDLESS, World::new(busy_grid(), 2));
    wait_for_turns(&client, 1).await;

    let paused = client.call::<BrokerPause>(&PauseRequest {}).await.unwrap();
    assert!(paused.is_paused);

    // A turn already in flight when the pause landed may still complete.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let held = report_turns(&client).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(report_turns(&client).await, held);

    let resumed = client.call::<BrokerPause>(&PauseRequest {}).await.unwrap();
    assert!(!resumed.is_paused);
    assert_eq!(resumed.turns, held);
    let progressed = wait_for_turns(&client, held + 1).await;
    assert!(progressed > held);

    client.call::<BrokerQuit>(&QuitRequest {}).await.unwrap();
    let response = run.await.unwrap().unwrap();
    assert!(response.turns > held);
    assert!(response.turns < ENDLESS);
}

#[tokio::test]
async fn quit_returns_early_and_clears_session() {
    let (_workers, _broker, client) = start_cluster(2).await;
    let run = spawn_run(&client, ENDLESS, World::new(busy_grid(), 2));
    wait_for_turns(&client, 3).await;

    let quit = client.call::<BrokerQuit>(&QuitRequest {}).await.unwrap();
    assert!(quit.turns >= 3);

    let response = run.await.unwrap().unwrap();
    assert!(response.turns < ENDLESS);
    assert!(response.turns >= quit.turns);

    let report = client.call::<BrokerReport>(&ReportRequest {}).await.unwrap();
    assert_eq!(report.turns, 0);
    assert_eq!(report.alive_cells_count, 0);
}

#[tokio::test]
async fn second_run_is_rejected_while_first_is_active() {
    let (_workers, _broker, client) = start_cluster(1).await;
    let run = spawn_run(&client, ENDLESS, World::new(busy_grid(), 1));
    wait_for_turns(&client, 1).await;

    let second = client
        .call::<BrokerRun>(&RunRequest {
            turns: 1,
            world: World::new(glider_4x4(), 1),
        })
        .await;
    assert!(matches!(second, Err(RpcError::Remote(message)) if message == "run already in progress"));

    client.call::<BrokerQuit>(&QuitRequest {}).await.unwrap();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn invalid_world_is_rejected_before_running() {
    let (_workers, _broker, client) = start_cluster(2).await;

    let too_many = client
        .call::<BrokerRun>(&RunRequest {
            turns: 1,
            world: World::new(glider_4x4(), 3),
        })
        .await;
    assert!(matches!(too_many, Err(RpcError::Remote(_))));

    let taller_than_grid = client
        .call::<BrokerRun>(&RunRequest {
            turns: 1,
            world: World::new(Grid::new(1, 4), 2),
        })
        .await;
    assert!(matches!(taller_than_grid, Err(RpcError::Remote(_))));
    assert_eq!(report_turns(&client).await, 0);
}

#[tokio::test]
async fn unreachable_worker_fails_the_run_but_not_the_broker() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap().to_string();
    drop(listener);
    let (_broker, client) = start_broker(vec![dead.clone()]).await;

    let result = client
        .call::<BrokerRun>(&RunRequest {
            turns: 5,
            world: World::new(glider_4x4(), 1),
        })
        .await;
    match result {
        Err(RpcError::Remote(message)) => {
            assert!(message.contains("worker 0"), "{message}");
            assert!(message.contains(&dead), "{message}");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }

    // The session still holds the initial world and the broker answers.
    let report = client.call::<BrokerReport>(&ReportRequest {}).await.unwrap();
    assert_eq!(report.turns, 0);
    assert_eq!(report.alive_cells_count, 5);
}

#[tokio::test]
async fn shutdown_stops_workers_and_broker() {
    let (workers, broker, client) = start_cluster(2).await;
    client
        .call::<BrokerRun>(&RunRequest {
            turns: 2,
            world: World::new(glider_4x4(), 2),
        })
        .await
        .unwrap();

    let response = client
        .call::<BrokerShutdown>(&ShutdownRequest {})
        .await
        .unwrap();
    assert_eq!(response.turns, 2);

    tokio::time::timeout(Duration::from_secs(5), broker.handle)
        .await
        .unwrap()
        .unwrap();
    for worker in workers {
        tokio::time::timeout(Duration::from_secs(5), worker.handle)
            .await
            .unwrap()
            .unwrap();
    }

    let after = client.call::<BrokerReport>(&ReportRequest {}).await;
    assert!(matches!(after, Err(RpcError::Connect { .. })));
}

#[tokio::test]
async fn shutdown_during_an_active_run_ends_the_run_and_every_process() {
    let (workers, broker, client) = start_cluster(2).await;
    let run = spawn_run(&client, ENDLESS, World::new(busy_grid(), 2));
    wait_for_turns(&client, 2).await;

    let response = client
        .call::<BrokerShutdown>(&ShutdownRequest {})
        .await
        .unwrap();
    assert!(response.turns >= 2);

    // The run either stops at a turn boundary or loses a worker mid-turn.
    match tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
    {
        Ok(finished) => assert!(finished.turns < ENDLESS),
        Err(RpcError::Remote(message)) => assert!(message.contains("worker"), "{message}"),
        Err(other) => panic!("unexpected run failure: {other}"),
    }

    tokio::time::timeout(Duration::from_secs(5), broker.handle)
        .await
        .unwrap()
        .unwrap();
    for worker in workers {
        assert!(worker.service.is_shutting_down());
        tokio::time::timeout(Duration::from_secs(5), worker.handle)
            .await
            .unwrap()
            .unwrap();
    }
}
