//! End to end against the loopback engine, answering from its own thread.

mod common;

use std::sync::Arc;

use anyhow::Result;
use gridwire::ErrorCode;
use turbosolver::DispatchSolver;
use turbosolver::Dispatcher;
use turbosolver::Error;
use turbosolver::SolverHandle;
use turbosolver::SolverService;
use turbosolver::Transport;
use turbosolver::TransportError;
use turbosolver::engine::Executor;

use common::SOLUTION;
use common::SOLVABLE;
use common::TableStrategy;
use common::UNSOLVABLE;
use common::config;

fn loopback(name: &str) -> Result<DispatchSolver> {
    let dispatcher = Dispatcher::connect(config(name), |inbox| Executor::attach(TableStrategy::sample(), inbox))?;
    Ok(DispatchSolver::new(Arc::new(dispatcher)))
}

#[tokio::test]
async fn test_lifecycle() -> Result<()> {
    let service = loopback("loopback-lifecycle")?;

    let handle = service.create(SOLVABLE).await?;
    assert_eq!(handle, SolverHandle(0));
    assert_eq!(service.solve(handle).await?, SOLUTION);
    service.destroy(handle).await?;

    assert_eq!(service.solve(handle).await, Err(Error::Engine(ErrorCode::NOT_AVAILABLE)));
    assert_eq!(service.destroy(handle).await, Err(Error::Engine(ErrorCode::NOT_AVAILABLE)));
    Ok(())
}

#[tokio::test]
async fn test_solver_ids_are_allocated_in_order() -> Result<()> {
    let service = loopback("loopback-ids")?;

    let first = service.create(SOLVABLE).await?;
    let second = service.create(UNSOLVABLE).await?;
    assert_eq!((first, second), (SolverHandle(0), SolverHandle(1)));

    // destroying does not recycle ids
    service.destroy(first).await?;
    assert_eq!(service.create(SOLVABLE).await?, SolverHandle(2));
    Ok(())
}

#[tokio::test]
async fn test_rejected_and_unsolvable_grids() -> Result<()> {
    let service = loopback("loopback-errors")?;

    assert_eq!(service.create("not a grid").await, Err(Error::Engine(ErrorCode::BAD_GRID)));

    let handle = service.create(UNSOLVABLE).await?;
    assert_eq!(service.solve(handle).await, Err(Error::NoSolution));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions() -> Result<()> {
    let service = loopback("loopback-concurrent")?;

    let sessions: Vec<_> = (0..32)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                let handle = service.create(SOLVABLE).await?;
                let solution = service.solve(handle).await?;
                service.destroy(handle).await?;
                Ok::<_, Error>((handle, solution))
            })
        })
        .collect();

    let mut handles = Vec::new();
    for session in sessions {
        let (handle, solution) = session.await??;
        assert_eq!(solution, SOLUTION);
        handles.push(handle.0);
    }
    handles.sort();
    assert_eq!(handles, (0..32).collect::<Vec<_>>());
    assert_eq!(service.dispatcher().pending_len(), 0);
    Ok(())
}

#[tokio::test]
async fn test_undecodable_request_is_refused() -> Result<()> {
    let executor = Executor::spawn(TableStrategy::sample(), |_| panic!("nothing to answer"))?;
    let err = executor.send(vec![0xFF, 0x01]).unwrap_err();
    assert!(matches!(err, TransportError::Io(_)), "got {:?}", err);
    Ok(())
}
