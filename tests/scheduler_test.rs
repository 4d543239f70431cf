/*!
 * Worker Pool Integration Tests
 *
 * Full runs over in-memory command streams: barrier rounds, global and
 * per-worker waits, failure reporting and pool errors
 */

use ems_kernel::core::types::SeatCoord;
use ems_kernel::core::types::WorkerId;
use ems_kernel::{
    Command, CommandQueue, CommandSource, EmsError, EventStore, MemorySink, Response,
    ResponseSink, SchedulerError, StateDelay, StoreError, WorkerPool,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn create(event_id: u32, rows: usize, cols: usize) -> Command {
    Command::Create {
        event_id,
        rows,
        cols,
    }
}

fn reserve(event_id: u32, coords: &[(usize, usize)]) -> Command {
    Command::Reserve {
        event_id,
        seats: coords.iter().copied().map(SeatCoord::from).collect(),
    }
}

fn run(workers: usize, commands: Vec<Command>) -> (Vec<Response>, ems_kernel::RunSummary) {
    let pool = WorkerPool::new(EventStore::default(), workers).unwrap();
    let sink = Arc::new(MemorySink::new());
    let summary = pool.run(CommandQueue::new(commands), sink.clone()).unwrap();
    (sink.responses(), summary)
}

/// Records when each command was handed out
struct RecordingSource {
    inner: CommandQueue,
    reads: Arc<Mutex<Vec<(Instant, Command)>>>,
}

impl CommandSource for RecordingSource {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        let command = self.inner.next_command()?;
        self.reads.lock().push((Instant::now(), command.clone()));
        Ok(command)
    }
}

/// Records when each response was delivered
#[derive(Default)]
struct TimedSink {
    deliveries: Mutex<Vec<(Instant, WorkerId, Response)>>,
}

impl ResponseSink for TimedSink {
    fn deliver(&self, worker: WorkerId, response: Response) -> io::Result<()> {
        self.deliveries.lock().push((Instant::now(), worker, response));
        Ok(())
    }
}

/// Hands a WAIT to worker 1 and keeps every other worker on `Empty` until
/// worker 1 has executed it and one more `Empty` was served; records the
/// reading thread
struct GatedWaitSource {
    inner: CommandQueue,
    wait: Option<Command>,
    issuer_reads: usize,
    released: bool,
    reads: Arc<Mutex<Vec<(Instant, String, Command)>>>,
}

impl CommandSource for GatedWaitSource {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        let reader = thread::current().name().unwrap_or_default().to_string();
        let command = if reader == "ems-worker-1" {
            self.issuer_reads += 1;
            match self.wait.take() {
                Some(wait) => wait,
                None => self.inner.next_command()?,
            }
        } else if self.issuer_reads < 2 || !self.released {
            self.released = self.issuer_reads >= 2;
            Command::Empty
        } else {
            self.inner.next_command()?
        };
        self.reads.lock().push((Instant::now(), reader, command.clone()));
        Ok(command)
    }
}

#[test]
fn test_single_worker_scenario() {
    let (responses, summary) = run(
        1,
        vec![
            create(1, 2, 2),
            reserve(1, &[(1, 1), (1, 2)]),
            reserve(1, &[(1, 2), (2, 1)]),
            Command::Show { event_id: 1 },
        ],
    );

    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0], Response::Created { event_id: 1 });
    assert_eq!(
        responses[1],
        Response::Reserved {
            event_id: 1,
            reservation_id: 1
        }
    );
    assert!(matches!(
        &responses[2],
        Response::Failed {
            error: StoreError::AlreadyReserved { seat },
            ..
        } if *seat == SeatCoord::new(1, 2)
    ));
    match &responses[3] {
        Response::Grid(grid) => assert_eq!(grid.to_rows(), vec![vec![1, 1], vec![0, 0]]),
        other => panic!("expected grid, got {:?}", other),
    }

    assert_eq!(summary.rounds, 1);
    assert_eq!(summary.stats.reservations_committed, 1);
    assert_eq!(summary.stats.reservations_rejected, 1);
    assert_eq!(summary.stats.failures, 1);
}

#[test]
fn test_barrier_separates_phases() {
    let mut commands: Vec<Command> = (1..=6).map(|id| create(id, 2, 2)).collect();
    commands.push(Command::Barrier);
    commands.extend((1..=6).map(|id| reserve(id, &[(2, 2)])));
    commands.push(Command::Barrier);
    commands.push(Command::ListEvents);

    let (responses, summary) = run(4, commands);

    let created = responses
        .iter()
        .filter(|r| matches!(r, Response::Created { .. }))
        .count();
    let reserved = responses
        .iter()
        .filter(|r| matches!(r, Response::Reserved { reservation_id: 1, .. }))
        .count();
    assert_eq!(created, 6);
    assert_eq!(reserved, 6);
    assert!(!responses.iter().any(Response::is_failure));

    let listed = responses
        .iter()
        .find_map(|r| match r {
            Response::Events { ids } => Some(ids.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(listed.len(), 6);

    assert_eq!(summary.rounds, 3);
    assert_eq!(summary.stats.barriers, 2);
    assert_eq!(summary.workers, 4);
}

#[test]
fn test_global_wait_after_barrier_blocks_dispatch() {
    let reads = Arc::new(Mutex::new(Vec::new()));
    let source = RecordingSource {
        inner: CommandQueue::new(vec![
            create(1, 1, 1),
            Command::Barrier,
            Command::Wait {
                delay_ms: 200,
                target_worker: 0,
            },
            Command::Show { event_id: 1 },
        ]),
        reads: reads.clone(),
    };

    let pool = WorkerPool::new(EventStore::default(), 3).unwrap();
    let sink = Arc::new(MemorySink::new());
    let summary = pool.run(source, sink.clone()).unwrap();
    assert_eq!(summary.rounds, 2);

    let reads = reads.lock();
    let read_at = |wanted: fn(&Command) -> bool| {
        reads
            .iter()
            .find(|(_, command)| wanted(command))
            .map(|(at, _)| *at)
            .unwrap()
    };
    let wait_at = read_at(|c| matches!(c, Command::Wait { .. }));
    let show_at = read_at(|c| matches!(c, Command::Show { .. }));
    assert!(show_at.duration_since(wait_at) >= Duration::from_millis(200));

    // Nothing was read while the waiting worker held dispatch
    let after_wait: Vec<_> = reads
        .iter()
        .filter(|(at, _)| *at > wait_at && *at < wait_at + Duration::from_millis(190))
        .collect();
    assert!(after_wait.is_empty());

    let responses = sink.responses();
    assert!(responses.contains(&Response::Waiting { delay_ms: 200 }));
    assert!(responses.iter().any(|r| matches!(r, Response::Grid(_))));
}

#[test]
fn test_targeted_wait_unknown_worker_is_ignored() {
    let (responses, summary) = run(
        2,
        vec![
            Command::Wait {
                delay_ms: 50,
                target_worker: 9,
            },
            Command::ListEvents,
        ],
    );

    assert_eq!(summary.stats.waits, 1);
    assert_eq!(responses, vec![Response::Events { ids: vec![] }]);
}

#[test]
fn test_targeted_wait_delays_that_worker() {
    let reads = Arc::new(Mutex::new(Vec::new()));
    let source = GatedWaitSource {
        inner: CommandQueue::new(vec![Command::Help; 20]),
        wait: Some(Command::Wait {
            delay_ms: 150,
            target_worker: 2,
        }),
        issuer_reads: 0,
        released: false,
        reads: reads.clone(),
    };

    let pool = WorkerPool::new(EventStore::default(), 2).unwrap();
    let summary = pool.run(source, MemorySink::new()).unwrap();
    assert_eq!(summary.stats.waits, 1);

    let reads = reads.lock();
    let (wait_at, issuer, _) = reads
        .iter()
        .find(|(_, _, command)| matches!(command, Command::Wait { .. }))
        .unwrap();
    assert_eq!(issuer, "ems-worker-1");

    let last_read = |worker: &str| {
        reads
            .iter()
            .filter(|(_, reader, _)| reader == worker)
            .map(|(at, _, _)| *at)
            .max()
            .unwrap()
    };

    // The target sleeps before its next read, the issuer keeps going
    assert!(last_read("ems-worker-2").duration_since(*wait_at) >= Duration::from_millis(150));
    assert!(last_read("ems-worker-1").duration_since(*wait_at) < Duration::from_millis(100));
}

#[test]
fn test_barrier_stops_all_workers_before_next_read() {
    let reads = Arc::new(Mutex::new(Vec::new()));
    let mut commands = vec![create(1, 2, 2), Command::Barrier, Command::Show { event_id: 1 }];
    commands.extend(vec![Command::Help; 12]);
    commands.push(Command::Barrier);
    commands.push(Command::ListEvents);
    commands.extend(vec![Command::Help; 4]);

    let source = RecordingSource {
        inner: CommandQueue::new(commands),
        reads: reads.clone(),
    };
    let sink = Arc::new(TimedSink::default());
    let pool = WorkerPool::new(EventStore::new(StateDelay::from_millis(50)), 4).unwrap();
    let summary = pool.run(source, sink.clone()).unwrap();
    assert_eq!(summary.rounds, 3);

    let reads = reads.lock();
    let list_at = reads
        .iter()
        .find(|(_, command)| matches!(command, Command::ListEvents))
        .map(|(at, _)| *at)
        .unwrap();
    let help_reads_before_list = reads
        .iter()
        .filter(|(at, command)| *at < list_at && matches!(command, Command::Help))
        .count();
    assert_eq!(help_reads_before_list, 12);

    let deliveries = sink.deliveries.lock();
    let grid_at = deliveries
        .iter()
        .find(|(_, _, response)| matches!(response, Response::Grid(_)))
        .map(|(at, _, _)| *at)
        .unwrap();
    // The slow SHOW finished before anything past the barrier was read
    assert!(grid_at < list_at);

    let pre_barrier = deliveries
        .iter()
        .filter(|(_, _, response)| matches!(response, Response::Help))
        .filter(|(at, _, _)| *at < list_at)
        .count();
    assert_eq!(pre_barrier, 12);
}

#[test]
fn test_invalid_and_empty_commands() {
    let (responses, summary) = run(
        2,
        vec![Command::Empty, Command::Invalid, Command::Help, Command::Empty],
    );

    assert_eq!(responses.len(), 2);
    assert!(responses.contains(&Response::Invalid));
    assert!(responses.contains(&Response::Help));
    assert_eq!(summary.stats.invalid, 1);
}

#[test]
fn test_store_delay_does_not_break_run() {
    let pool = WorkerPool::new(EventStore::new(StateDelay::from_millis(1)), 2).unwrap();
    let sink = Arc::new(MemorySink::new());
    pool.run(
        CommandQueue::new(vec![
            create(1, 2, 2),
            Command::Barrier,
            reserve(1, &[(1, 1), (2, 2)]),
            Command::Barrier,
            Command::Show { event_id: 1 },
        ]),
        sink.clone(),
    )
    .unwrap();

    let grid = sink
        .responses()
        .into_iter()
        .find_map(|r| match r {
            Response::Grid(grid) => Some(grid),
            _ => None,
        })
        .unwrap();
    assert_eq!(grid.seats, vec![1, 0, 0, 1]);
}

#[test]
fn test_store_terminated_after_run() {
    let store = EventStore::default();
    let pool = WorkerPool::new(store.clone(), 2).unwrap();
    pool.run(CommandQueue::new(vec![create(1, 1, 1)]), MemorySink::new())
        .unwrap();

    assert!(!store.is_initialized());
    assert_eq!(store.list(), Err(StoreError::NotInitialized));
}

#[test]
fn test_invalid_worker_count() {
    assert!(matches!(
        WorkerPool::new(EventStore::default(), 0),
        Err(SchedulerError::InvalidWorkerCount(0))
    ));
    assert!(matches!(
        WorkerPool::new(EventStore::default(), 100_000),
        Err(SchedulerError::InvalidWorkerCount(_))
    ));
}

struct FailingSource {
    served: bool,
}

impl CommandSource for FailingSource {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        if self.served {
            return Err(SchedulerError::Source("disk on fire".into()));
        }
        self.served = true;
        Ok(Command::Help)
    }
}

#[test]
fn test_source_failure_fails_run() {
    let pool = WorkerPool::new(EventStore::default(), 2).unwrap();
    let result = pool.run(FailingSource { served: false }, MemorySink::new());

    assert!(matches!(
        result,
        Err(EmsError::Scheduler(SchedulerError::Source(_)))
    ));
}

struct PanickingSource {
    panicked: bool,
}

impl CommandSource for PanickingSource {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        if !self.panicked {
            self.panicked = true;
            panic!("source exploded");
        }
        Ok(Command::EndOfCommands)
    }
}

#[test]
fn test_worker_panic_is_reported() {
    let pool = WorkerPool::new(EventStore::default(), 2).unwrap();
    let result = pool.run(PanickingSource { panicked: false }, MemorySink::new());

    assert!(matches!(
        result,
        Err(EmsError::Scheduler(SchedulerError::WorkerPanicked(_)))
    ));
}

/// Fails once, then would keep serving commands
struct FlakySource {
    reads: usize,
}

impl CommandSource for FlakySource {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        self.reads += 1;
        match self.reads {
            1 => Ok(create(1, 1, 1)),
            2 => Err(SchedulerError::Source("transient".into())),
            n if n < 50 => Ok(create(n as u32, 1, 1)),
            _ => Ok(Command::EndOfCommands),
        }
    }
}

#[test]
fn test_source_failure_is_terminal_for_every_worker() {
    let pool = WorkerPool::new(EventStore::default(), 4).unwrap();
    let sink = Arc::new(MemorySink::new());
    let result = pool.run(FlakySource { reads: 0 }, sink.clone());

    assert!(matches!(
        result,
        Err(EmsError::Scheduler(SchedulerError::Source(_)))
    ));
    assert_eq!(sink.responses(), vec![Response::Created { event_id: 1 }]);
}
