use battleship_server::{
    Board, Cell, Coordinate, Orientation, PlacementError, ShipKind, ShotOutcome, BOARD_SIZE,
    FLEET, FLEET_SIZE, TOTAL_SHIP_CELLS,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn at(row: i32, col: i32) -> Coordinate {
    Coordinate::new(row, col)
}

/// Every ship horizontal at column 0, one per row from the top.
fn stacked_fleet() -> Board {
    let mut board = Board::new();
    for (row, kind) in FLEET.iter().enumerate() {
        board
            .place(*kind, at(row as i32, 0), Orientation::Horizontal)
            .unwrap();
    }
    board
}

#[test]
fn test_place_marks_cells() {
    let mut board = Board::new();
    board
        .place(ShipKind::Cruiser, at(2, 3), Orientation::Vertical)
        .unwrap();
    for row in 2..5 {
        assert_eq!(board.cell(at(row, 3)), Some(Cell::Ship));
    }
    assert_eq!(board.cell(at(5, 3)), Some(Cell::Empty));
    assert_eq!(board.ship_count(), 1);
    assert!(board.has_ship(ShipKind::Cruiser));
    assert_eq!(board.ships()[0].origin(), at(2, 3));
}

#[test]
fn test_place_out_of_bounds_is_rejected() {
    let mut board = Board::new();
    // carrier at column 6 would need columns 6..=10
    assert_eq!(
        board.place(ShipKind::Carrier, at(0, 6), Orientation::Horizontal),
        Err(PlacementError::OutOfBounds)
    );
    assert_eq!(
        board.place(ShipKind::Destroyer, at(9, 0), Orientation::Vertical),
        Err(PlacementError::OutOfBounds)
    );
    assert_eq!(
        board.place(ShipKind::Destroyer, at(-1, 0), Orientation::Horizontal),
        Err(PlacementError::OutOfBounds)
    );
    assert_eq!(board.ship_count(), 0);
}

#[test]
fn test_place_on_edge_is_accepted() {
    let mut board = Board::new();
    board
        .place(ShipKind::Carrier, at(9, 5), Orientation::Horizontal)
        .unwrap();
    board
        .place(ShipKind::Destroyer, at(8, 0), Orientation::Vertical)
        .unwrap();
    assert_eq!(board.ship_count(), 2);
}

#[test]
fn test_collision_leaves_board_untouched() {
    let mut board = Board::new();
    board
        .place(ShipKind::Battleship, at(4, 2), Orientation::Horizontal)
        .unwrap();
    let before = board.render(true);
    assert_eq!(
        board.place(ShipKind::Cruiser, at(2, 4), Orientation::Vertical),
        Err(PlacementError::Collision)
    );
    assert_eq!(board.render(true), before);
    assert_eq!(board.ship_count(), 1);
    assert_eq!(board.cell(at(2, 4)), Some(Cell::Empty));
}

#[test]
fn test_shoot_hit_sink_and_repeat() {
    let mut board = Board::new();
    board
        .place(ShipKind::Destroyer, at(0, 0), Orientation::Horizontal)
        .unwrap();

    assert_eq!(board.shoot(at(0, 0)), ShotOutcome::Hit);
    assert_eq!(board.cell(at(0, 0)), Some(Cell::Hit));
    assert!(board.ship_sunk_at(at(0, 0)).is_none());

    assert_eq!(board.shoot(at(0, 1)), ShotOutcome::Sunk);
    let sunk = board.ship_sunk_at(at(0, 0)).unwrap();
    assert_eq!(sunk.kind(), ShipKind::Destroyer);
    assert_eq!(sunk.hits().len(), 2);

    // repeat shots change nothing
    assert_eq!(board.shoot(at(0, 1)), ShotOutcome::AlreadyShot);
    assert_eq!(board.cell(at(0, 1)), Some(Cell::Hit));
    assert_eq!(board.shots_fired(), 2);
}

#[test]
fn test_shoot_miss_then_repeat() {
    let mut board = stacked_fleet();
    assert_eq!(board.shoot(at(9, 9)), ShotOutcome::Miss);
    assert_eq!(board.cell(at(9, 9)), Some(Cell::Miss));
    assert_eq!(board.shoot(at(9, 9)), ShotOutcome::AlreadyShot);
    assert_eq!(board.cell(at(9, 9)), Some(Cell::Miss));
}

#[test]
fn test_shoot_off_grid_is_a_miss_without_side_effects() {
    let mut board = stacked_fleet();
    assert_eq!(board.shoot(at(10, 0)), ShotOutcome::Miss);
    assert_eq!(board.shoot(at(0, -1)), ShotOutcome::Miss);
    assert_eq!(board.shots_fired(), 0);
}

#[test]
fn test_defeat_requires_every_ship_sunk() {
    let mut board = stacked_fleet();
    assert!(!board.is_defeated());
    let mut last = ShotOutcome::Miss;
    let mut fired = 0;
    for (row, kind) in FLEET.iter().enumerate() {
        for col in 0..kind.length() as i32 {
            assert!(!board.is_defeated());
            last = board.shoot(at(row as i32, col));
            fired += 1;
        }
        assert_eq!(last, ShotOutcome::Sunk);
    }
    assert_eq!(fired, TOTAL_SHIP_CELLS);
    assert!(board.is_defeated());
}

#[test]
fn test_empty_board_is_not_defeated() {
    assert!(!Board::new().is_defeated());
}

#[test]
fn test_random_fleet_places_whole_catalogue() {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut board = Board::new();
    board.random_fleet(&mut rng).unwrap();
    assert_eq!(board.ship_count(), FLEET_SIZE);
    for kind in FLEET {
        assert!(board.has_ship(kind));
    }
    let occupied = (0..BOARD_SIZE as i32)
        .flat_map(|r| (0..BOARD_SIZE as i32).map(move |c| at(r, c)))
        .filter(|&c| board.cell(c) == Some(Cell::Ship))
        .count();
    assert_eq!(occupied, TOTAL_SHIP_CELLS);
}

#[test]
fn test_random_fleet_keeps_existing_ships() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut board = Board::new();
    board
        .place(ShipKind::Carrier, at(0, 0), Orientation::Horizontal)
        .unwrap();
    board.random_fleet(&mut rng).unwrap();
    assert_eq!(board.ship_count(), FLEET_SIZE);
    assert_eq!(board.ships()[0].origin(), at(0, 0));
}

#[test]
fn test_render_hides_ships_unless_revealed() {
    let mut board = Board::new();
    board
        .place(ShipKind::Submarine, at(0, 0), Orientation::Horizontal)
        .unwrap();
    board.shoot(at(0, 0));
    board.shoot(at(5, 5));

    let hidden = board.render(false);
    let revealed = board.render(true);
    let first_row = |s: &str| s.lines().nth(1).unwrap().to_string();
    assert!(first_row(&hidden).contains('X'));
    assert!(!first_row(&hidden).contains('S'));
    assert!(first_row(&revealed).contains('S'));
    assert!(revealed.lines().nth(6).unwrap().contains('O'));
    assert_eq!(revealed, board.to_string());
}

#[test]
fn test_place_at_integer_limits_is_out_of_bounds() {
    let mut board = Board::new();
    for origin in [at(0, i32::MAX), at(i32::MAX, 0), at(0, i32::MIN), at(i32::MIN, i32::MIN)] {
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            assert_eq!(
                board.place(ShipKind::Destroyer, origin, orientation),
                Err(PlacementError::OutOfBounds)
            );
        }
    }
    assert_eq!(board.ship_count(), 0);
    assert_eq!(
        at(0, i32::MAX).offset(Orientation::Horizontal, 1),
        at(0, i32::MAX)
    );
}
