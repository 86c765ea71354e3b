//! Server-wide directory of live matches.
//!
//! Lock order is always registry first, then a match. A match never reaches
//! back into the registry, so the two can never deadlock.

use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::common::{ConnectionId, MatchId};
use crate::game::{JoinOutcome, Match, MatchError, Peer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Every match slot is in use.
    CapacityExceeded,
    NotFound(MatchId),
    AlreadyFull(MatchId),
    /// The connection already plays in a live match.
    AlreadyInMatch(MatchId),
    /// The match refused the join for another reason (e.g. it just finished).
    Rejected(MatchError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::CapacityExceeded => {
                write!(f, "Server is full, try again later")
            }
            RegistryError::NotFound(id) => write!(f, "Match {} does not exist", id),
            RegistryError::AlreadyFull(id) => write!(f, "Match {} is already full", id),
            RegistryError::AlreadyInMatch(id) => {
                write!(f, "You are already playing in match {}", id)
            }
            RegistryError::Rejected(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RegistryError {}

struct Entry {
    game: Arc<Match>,
    // returned to the semaphore when the entry is dropped
    _permit: OwnedSemaphorePermit,
}

#[derive(Default)]
struct Directory {
    matches: HashMap<MatchId, Entry>,
    by_connection: HashMap<ConnectionId, MatchId>,
    next_id: u32,
}

impl Directory {
    fn allocate_id(&mut self) -> MatchId {
        self.next_id += 1;
        MatchId(self.next_id)
    }

    fn check_free(&self, connection: ConnectionId) -> Result<(), RegistryError> {
        match self.by_connection.get(&connection) {
            Some(id) => Err(RegistryError::AlreadyInMatch(*id)),
            None => Ok(()),
        }
    }
}

/// Owns every live match and the capacity limit on them.
///
/// Ids are allocated from 1 upwards and never reused within a process.
pub struct Registry {
    directory: Mutex<Directory>,
    capacity: Arc<Semaphore>,
    max_matches: usize,
}

impl Registry {
    /// Registry admitting up to `max_matches` live matches, capped at
    /// [`Semaphore::MAX_PERMITS`].
    pub fn new(max_matches: usize) -> Self {
        let max_matches = max_matches.min(Semaphore::MAX_PERMITS);
        Self {
            directory: Mutex::new(Directory::default()),
            capacity: Arc::new(Semaphore::new(max_matches)),
            max_matches,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new match with `peer` in the first slot.
    pub fn create(&self, peer: Peer) -> Result<Arc<Match>, RegistryError> {
        let mut dir = self.lock();
        dir.check_free(peer.connection)?;
        let permit = Arc::clone(&self.capacity)
            .try_acquire_owned()
            .map_err(|_| RegistryError::CapacityExceeded)?;
        let id = dir.allocate_id();
        let game = Arc::new(Match::new(id));
        let connection = peer.connection;
        let name = peer.name.clone();
        game.join(peer).map_err(RegistryError::Rejected)?;
        dir.matches.insert(
            id,
            Entry {
                game: Arc::clone(&game),
                _permit: permit,
            },
        );
        dir.by_connection.insert(connection, id);
        info!("Match {} created by {}", id, name);
        Ok(game)
    }

    /// Seat `peer` in the second slot of match `id`.
    ///
    /// The registry lock is held across the match join so two concurrent
    /// joiners cannot both see a free slot.
    pub fn join(
        &self,
        id: MatchId,
        peer: Peer,
    ) -> Result<(Arc<Match>, JoinOutcome), RegistryError> {
        let mut dir = self.lock();
        dir.check_free(peer.connection)?;
        let game = dir
            .matches
            .get(&id)
            .map(|e| Arc::clone(&e.game))
            .ok_or(RegistryError::NotFound(id))?;
        let connection = peer.connection;
        let outcome = game.join(peer).map_err(|e| match e {
            MatchError::Full => RegistryError::AlreadyFull(id),
            other => RegistryError::Rejected(other),
        })?;
        dir.by_connection.insert(connection, id);
        Ok((game, outcome))
    }

    /// Match the connection currently plays in.
    pub fn match_for(&self, connection: ConnectionId) -> Option<Arc<Match>> {
        let dir = self.lock();
        let id = dir.by_connection.get(&connection)?;
        dir.matches.get(id).map(|e| Arc::clone(&e.game))
    }

    pub fn get(&self, id: MatchId) -> Option<Arc<Match>> {
        self.lock().matches.get(&id).map(|e| Arc::clone(&e.game))
    }

    /// Remove match `id` and release its capacity slot.
    ///
    /// Returns `false` if it was already gone, so callers racing to retire
    /// the same match release the slot exactly once.
    pub fn retire(&self, id: MatchId) -> bool {
        let mut dir = self.lock();
        let Some(entry) = dir.matches.remove(&id) else {
            return false;
        };
        dir.by_connection.retain(|_, m| *m != id);
        debug!("Match {} retired ({:?})", id, entry.game);
        true
    }

    /// Number of matches currently registered.
    pub fn live_matches(&self) -> usize {
        self.lock().matches.len()
    }

    /// Matches that can still be created before hitting the limit.
    pub fn available_slots(&self) -> usize {
        self.capacity.available_permits()
    }

    pub fn max_matches(&self) -> usize {
        self.max_matches
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("live_matches", &self.live_matches())
            .field("max_matches", &self.max_matches)
            .finish()
    }
}
