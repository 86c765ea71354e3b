#![cfg(feature = "std")]

use battleship_server::{
    Board, Cell, Coordinate, Orientation, PlacementError, ShipKind, ShotOutcome, BOARD_SIZE,
    FLEET,
};
use proptest::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_board(seed: u64) -> Board {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut board = Board::new();
    board.random_fleet(&mut rng).unwrap();
    let shots = rng.random_range(0..BOARD_SIZE as usize * 4);
    for _ in 0..shots {
        let r = rng.random_range(0..BOARD_SIZE as i32);
        let c = rng.random_range(0..BOARD_SIZE as i32);
        board.shoot(Coordinate::new(r, c));
    }
    board
}

fn kind_strategy() -> impl Strategy<Value = ShipKind> {
    prop::sample::select(FLEET.to_vec())
}

fn orientation_strategy() -> impl Strategy<Value = Orientation> {
    prop_oneof![Just(Orientation::Horizontal), Just(Orientation::Vertical)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn place_succeeds_iff_in_bounds_and_free(
        seed in any::<u64>(),
        kind in kind_strategy(),
        row in -2..12i32,
        col in -2..12i32,
        orientation in orientation_strategy(),
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = Board::new();
        // a partial fleet so collisions are possible
        for other in FLEET.iter().copied().filter(|k| *k != kind).take(2) {
            let (origin, o) = board.random_placement(&mut rng, other).unwrap();
            board.place(other, origin, o).unwrap();
        }
        let cells: Vec<Coordinate> = (0..kind.length() as i32)
            .map(|i| Coordinate::new(row, col).offset(orientation, i))
            .collect();
        let in_bounds = cells.iter().all(Coordinate::is_valid);
        let free = cells.iter().all(|c| board.cell(*c) != Some(Cell::Ship));
        let before = board.ship_count();

        let result = board.place(kind, Coordinate::new(row, col), orientation);
        match (in_bounds, free) {
            (false, _) => prop_assert_eq!(result, Err(PlacementError::OutOfBounds)),
            (true, false) => prop_assert_eq!(result, Err(PlacementError::Collision)),
            (true, true) => prop_assert_eq!(result, Ok(())),
        }
        prop_assert_eq!(board.ship_count(), before + usize::from(result.is_ok()));
    }

    #[test]
    fn repeat_shot_is_idempotent(seed in any::<u64>(), row in 0..BOARD_SIZE as i32, col in 0..BOARD_SIZE as i32) {
        let mut board = random_board(seed);
        let target = Coordinate::new(row, col);
        let _ = board.shoot(target);
        let after_first = board.render(true);
        let shots = board.shots_fired();

        prop_assert_eq!(board.shoot(target), ShotOutcome::AlreadyShot);
        prop_assert_eq!(board.render(true), after_first);
        prop_assert_eq!(board.shots_fired(), shots);
        prop_assert!(board.cell(target).unwrap().is_fired());
    }

    #[test]
    fn defeated_iff_every_ship_fully_hit(seed in any::<u64>()) {
        let board = random_board(seed);
        let all_hit = board.ships().iter().all(|s| s.hits().len() == s.kind().length());
        prop_assert_eq!(board.is_defeated(), all_hit);
    }

    #[test]
    fn hits_never_exceed_length(seed in any::<u64>()) {
        let board = random_board(seed);
        for ship in board.ships() {
            prop_assert!(ship.hits().len() <= ship.kind().length());
            for hit in ship.hits() {
                prop_assert_eq!(board.cell(*hit), Some(Cell::Hit));
            }
        }
    }
}
