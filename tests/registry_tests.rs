#![cfg(feature = "std")]

use std::sync::Arc;
use std::thread;

use battleship_server::{
    ConnectionId, JoinOutcome, MatchError, MatchId, Outbox, Peer, Phase, Registry, RegistryError,
};

fn peer(name: &str, id: u64) -> Peer {
    // the receiver is dropped; replies to these peers are discarded
    let (outbox, _) = Outbox::channel();
    Peer::new(name, ConnectionId(id), outbox)
}

#[test]
fn test_ids_are_increasing_and_not_reused() {
    let registry = Registry::new(4);
    let a = registry.create(peer("a", 1)).unwrap();
    let b = registry.create(peer("b", 2)).unwrap();
    assert_eq!(a.id(), MatchId(1));
    assert_eq!(b.id(), MatchId(2));
    assert!(registry.retire(a.id()));
    let c = registry.create(peer("c", 3)).unwrap();
    assert_eq!(c.id(), MatchId(3));
}

#[test]
fn test_capacity_bound() {
    let registry = Registry::new(2);
    let first = registry.create(peer("a", 1)).unwrap();
    registry.create(peer("b", 2)).unwrap();
    assert_eq!(registry.available_slots(), 0);
    assert_eq!(
        registry.create(peer("c", 3)).unwrap_err(),
        RegistryError::CapacityExceeded
    );

    assert!(registry.retire(first.id()));
    assert_eq!(registry.available_slots(), 1);
    registry.create(peer("c", 3)).unwrap();
    assert_eq!(
        registry.create(peer("d", 4)).unwrap_err(),
        RegistryError::CapacityExceeded
    );
    assert_eq!(registry.live_matches(), 2);
}

#[test]
fn test_oversized_capacity_is_clamped() {
    let registry = Registry::new(usize::MAX);
    assert_eq!(registry.max_matches(), tokio::sync::Semaphore::MAX_PERMITS);
    assert_eq!(registry.available_slots(), tokio::sync::Semaphore::MAX_PERMITS);
    registry.create(peer("a", 1)).unwrap();
    assert_eq!(registry.available_slots(), tokio::sync::Semaphore::MAX_PERMITS - 1);
}

#[test]
fn test_retire_is_idempotent() {
    let registry = Registry::new(1);
    let game = registry.create(peer("a", 1)).unwrap();
    assert!(registry.retire(game.id()));
    assert!(!registry.retire(game.id()));
    // only one slot was released
    assert_eq!(registry.available_slots(), 1);
    assert!(registry.match_for(ConnectionId(1)).is_none());
    assert!(registry.get(game.id()).is_none());
}

#[test]
fn test_join_paths() {
    let registry = Registry::new(4);
    let game = registry.create(peer("Ana", 1)).unwrap();

    assert_eq!(
        registry.join(MatchId(99), peer("Bea", 2)).unwrap_err(),
        RegistryError::NotFound(MatchId(99))
    );

    let (joined, outcome) = registry.join(game.id(), peer("Bea", 2)).unwrap();
    assert!(Arc::ptr_eq(&joined, &game));
    assert!(matches!(outcome, JoinOutcome::Paired { ref opponent } if opponent.name == "Ana"));
    assert_eq!(game.phase(), Phase::PlacingShips);

    assert_eq!(
        registry.join(game.id(), peer("Cid", 3)).unwrap_err(),
        RegistryError::AlreadyFull(game.id())
    );
    assert!(Arc::ptr_eq(&registry.match_for(ConnectionId(2)).unwrap(), &game));
    assert!(registry.match_for(ConnectionId(3)).is_none());
}

#[test]
fn test_one_match_per_connection() {
    let registry = Registry::new(4);
    let game = registry.create(peer("Ana", 1)).unwrap();
    assert_eq!(
        registry.create(peer("Ana", 1)).unwrap_err(),
        RegistryError::AlreadyInMatch(game.id())
    );
    assert_eq!(
        registry.join(game.id(), peer("Ana", 1)).unwrap_err(),
        RegistryError::AlreadyInMatch(game.id())
    );
    assert_eq!(registry.live_matches(), 1);
}

#[test]
fn test_retire_frees_both_players() {
    let registry = Registry::new(4);
    let game = registry.create(peer("Ana", 1)).unwrap();
    registry.join(game.id(), peer("Bea", 2)).unwrap();
    registry.retire(game.id());
    assert!(registry.match_for(ConnectionId(1)).is_none());
    assert!(registry.match_for(ConnectionId(2)).is_none());
    registry.create(peer("Bea", 2)).unwrap();
}

#[test]
fn test_join_of_finished_match_is_rejected() {
    let registry = Registry::new(4);
    let game = registry.create(peer("Ana", 1)).unwrap();
    assert!(game.abandon(ConnectionId(1)).is_none());
    assert_eq!(
        registry.join(game.id(), peer("Bea", 2)).unwrap_err(),
        RegistryError::Rejected(MatchError::Finished)
    );
}

#[test]
fn test_concurrent_creates_respect_capacity() {
    let registry = Arc::new(Registry::new(5));
    let handles: Vec<_> = (0..20u64)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.create(peer("p", i)).is_ok())
        })
        .collect();
    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(created, 5);
    assert_eq!(registry.live_matches(), 5);
    assert_eq!(registry.available_slots(), 0);
}

#[test]
fn test_concurrent_joins_only_one_succeeds() {
    for _ in 0..20 {
        let registry = Arc::new(Registry::new(1));
        let id = registry.create(peer("host", 0)).unwrap().id();
        let handles: Vec<_> = (1..=4u64)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.join(id, peer("guest", i)).is_ok())
            })
            .collect();
        let joined = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(joined, 1);
    }
}
