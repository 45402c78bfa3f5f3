use std::sync::Arc;
use std::thread;
use std::time::Duration;
use switchyard::error::Error;
use switchyard::queue::{never_cancel, QueueListener};

#[test]
fn close_drains_queued_item_and_rejects_further_calls() {
    let queue: QueueListener<u32> = QueueListener::new(1);
    queue.push(7, &never_cancel()).unwrap();

    queue.close().unwrap();

    match queue.accept() {
        Err(Error::ClosedQueue) => {}
        other => panic!("expected ClosedQueue, got {:?}", other),
    }
    match queue.push(9, &never_cancel()) {
        Err(Error::ClosedQueue) => {}
        other => panic!("expected ClosedQueue, got {:?}", other),
    }

    // Idempotent: a second close must not panic or error.
    queue.close().unwrap();
}

#[test]
fn close_wakes_a_push_blocked_on_a_full_queue() {
    let queue: Arc<QueueListener<u32>> = Arc::new(QueueListener::new(1));
    queue.push(1, &never_cancel()).unwrap();

    let waiting_queue = queue.clone();
    let blocked_push = thread::spawn(move || waiting_queue.push(2, &never_cancel()));

    thread::sleep(Duration::from_millis(20));
    queue.close().unwrap();

    match blocked_push.join().unwrap() {
        Err(Error::ClosedQueue) => {}
        other => panic!("expected ClosedQueue, got {:?}", other),
    }
}

#[test]
fn addr_is_tagged_queue() {
    let queue: QueueListener<u32> = QueueListener::new(1);
    assert_eq!(queue.addr().network(), "queue");
    assert_eq!(queue.addr().to_string(), "queue");
}
