use super::*;
use std::thread;

#[test]
fn test_move_budget_limit() {
    let budget = MoveBudget::new(Duration::from_millis(100), Duration::from_millis(2_000));
    assert_eq!(budget.movetime_ms(), 100);
    assert_eq!(budget.limit(), Duration::from_millis(2_100));
}

#[test]
fn test_deadline_expiry() {
    let deadline = Deadline::after(Duration::from_millis(10));
    assert!(!deadline.expired());

    thread::sleep(Duration::from_millis(20));
    assert!(deadline.expired());
    assert_eq!(deadline.remaining(), Duration::ZERO);
}

#[test]
fn test_cancel_flag_shared_between_clones() {
    let flag = CancelFlag::new();
    let handle = flag.clone();
    assert!(!flag.is_cancelled());

    thread::spawn(move || handle.cancel()).join().unwrap();
    assert!(flag.is_cancelled());
}
