//! Session-level tests for the falling-piece simulation
//!
//! Test categories:
//! - Landing and promotion of the next piece
//! - Line clearing and scoring
//! - Top-out detection
//! - Pause, soft drop and input gating
//! - Render grid consistency

use std::time::Duration;

use gridfall::config::Settings;
use gridfall::game::{
    test_helpers::*, CellState, Game, GameEvent, GameState, Intent, LANDING_BONUS,
    LINE_CLEAR_BONUS,
};
use gridfall::grid::Position;
use gridfall::tetromino::{
    Direction, PieceProvider, RandomPieceProvider, SequencePieceProvider, Shape,
};

fn sequence_game(pieces: Vec<Shape>) -> Game {
    Game::with_provider(
        &Settings::default(),
        Box::new(SequencePieceProvider::new(pieces)),
    )
}

fn tick_until_score_changes(game: &mut Game) {
    let start = game.score;
    for _ in 0..100 {
        game.tick();
        if game.score != start || game.is_game_over() {
            return;
        }
    }
    panic!("score never changed");
}

// ============================================================================
// Landing Tests
// ============================================================================

mod landing {
    use super::*;

    #[test]
    fn t_piece_lands_on_floor_and_next_is_promoted() {
        let mut game = sequence_game(vec![Shape::T, Shape::O, Shape::I]);
        assert_eq!(game.current.shape, Shape::T);
        assert_eq!(game.current.reference(), game.spawn_position());

        let mut last_legal = game.current.positions();
        while !game.current.landed {
            last_legal = game.current.positions();
            game.current.try_move(Direction::Down, &game.grid);
        }
        assert_eq!(game.current.positions(), last_legal);

        game.check_tetromino_landed();

        assert_eq!(game.score, LANDING_BONUS);
        assert_eq!(game.grid.total_filled_cells(), 4);
        for pos in last_legal {
            assert!(game.grid.get(pos.x, pos.y).is_some(), "{:?} not filled", pos);
        }
        assert_eq!(game.current.shape, Shape::O);
        assert!(game.current.is_current);
        assert!(!game.current.landed);
        assert_eq!(game.next.shape, Shape::I);
        assert!(!game.next.is_current);
    }

    #[test]
    fn t_piece_rests_on_bottom_row() {
        let mut game = sequence_game(vec![Shape::T, Shape::O]);

        tick_until_score_changes(&mut game);

        let bottom = game.grid.height() as i32 - 1;
        assert_eq!(game.grid.filled_count_in_row(bottom as usize), 3);
        assert_eq!(game.grid.filled_count_in_row(bottom as usize - 1), 1);
        assert!(game.grid.get(5, bottom - 1).is_some());
    }

    #[test]
    fn landing_emits_event() {
        let mut game = sequence_game(vec![Shape::O]);
        game.take_events();

        tick_until_score_changes(&mut game);

        let events = game.take_events();
        assert!(events.contains(&GameEvent::PieceLanded));
    }

    #[test]
    fn landed_blocks_belong_to_landed_piece() {
        let mut game = sequence_game(vec![Shape::S, Shape::Z]);
        let id = game.current.id;

        tick_until_score_changes(&mut game);

        assert!(game.grid.blocks().all(|b| b.piece == id && b.is_alive()));
        assert_ne!(game.current.id, id);
    }

    #[test]
    fn landing_resets_soft_drop() {
        let mut game = sequence_game(vec![Shape::O]);
        game.handle_input(Intent::SoftDrop(true));
        assert!(game.timer.is_soft_drop());

        tick_until_score_changes(&mut game);

        assert!(!game.timer.is_soft_drop());
        assert_eq!(game.fall_interval(), Duration::from_millis(200));
    }

    #[test]
    fn pieces_stack() {
        let mut game = sequence_game(vec![Shape::O]);

        tick_until_score_changes(&mut game);
        tick_until_score_changes(&mut game);

        assert_eq!(game.score, 2 * LANDING_BONUS);
        assert_eq!(game.grid.total_filled_cells(), 8);
        let bottom = game.grid.height() as i32 - 1;
        for y in (bottom - 3)..=bottom {
            assert!(game.grid.get(5, y).is_some());
            assert!(game.grid.get(6, y).is_some());
        }
    }
}

// ============================================================================
// Line Clearing Tests
// ============================================================================

mod line_clearing {
    use super::*;

    #[test]
    fn completing_a_row_scores_landing_and_clear_in_one_tick() {
        let settings = Settings::default();
        let bottom = settings.grid_height - 1;
        let mut grid = empty_grid(&settings);
        fill_row_with_gap(&mut grid, bottom, 5);

        let mut game = Game::with_grid(&settings, grid, piece_at(Shape::I, 5, 0));
        game.take_events();

        tick_until_score_changes(&mut game);

        assert_eq!(game.score, LANDING_BONUS + LINE_CLEAR_BONUS);
        assert_eq!(game.lines_cleared, 1);

        // The three upper blocks of the I dropped one row.
        assert_eq!(game.grid.total_filled_cells(), 3);
        assert_eq!(game.grid.filled_count_in_row(bottom), 1);
        for y in (bottom - 2)..=bottom {
            let block = game.grid.get(5, y as i32).expect("shifted block");
            assert_eq!(block.position, Position::new(5, y as i32));
        }

        let events = game.take_events();
        let landed = events.iter().position(|e| *e == GameEvent::PieceLanded);
        let cleared = events.iter().position(|e| *e == GameEvent::LinesCleared(1));
        assert!(landed.is_some() && cleared.is_some());
        assert!(landed < cleared);
    }

    #[test]
    fn two_rows_award_two_bonuses() {
        let settings = Settings::default();
        let mut grid = empty_grid(&settings);
        fill_row(&mut grid, settings.grid_height - 1);
        fill_row(&mut grid, settings.grid_height - 2);

        let mut game = Game::with_grid(&settings, grid, piece_at(Shape::O, 4, 0));
        let cleared = game.check_full_lines();

        assert_eq!(cleared.count(), 2);
        assert_eq!(game.score, 200);
        assert_eq!(game.lines_cleared, 2);
        assert_eq!(game.grid.total_filled_cells(), 0);
    }

    #[test]
    fn no_full_rows_no_score() {
        let settings = Settings::default();
        let mut grid = empty_grid(&settings);
        fill_row_with_gap(&mut grid, settings.grid_height - 1, 0);

        let mut game = Game::with_grid(&settings, grid.clone(), piece_at(Shape::O, 4, 0));
        game.take_events();
        let cleared = game.check_full_lines();

        assert!(cleared.is_empty());
        assert_eq!(game.score, 0);
        assert_eq!(game.grid, grid);
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn clear_emits_row_count() {
        let settings = Settings::default();
        let mut grid = empty_grid(&settings);
        fill_row(&mut grid, settings.grid_height - 1);
        fill_row(&mut grid, settings.grid_height - 3);

        let mut game = Game::with_grid(&settings, grid, piece_at(Shape::O, 4, 0));
        game.take_events();
        game.check_full_lines();

        assert!(game.take_events().contains(&GameEvent::LinesCleared(2)));
    }
}

// ============================================================================
// Game Over Tests
// ============================================================================

mod game_over {
    use super::*;

    fn blocked_spawn_game() -> Game {
        let settings = Settings::default();
        let mut grid = empty_grid(&settings);
        for x in 4..=6 {
            grid.place(filler(x, 1));
        }
        let spawn = settings.spawn_col;
        Game::with_grid(&settings, grid, piece_at(Shape::T, spawn, settings.spawn_row))
    }

    #[test]
    fn landing_on_spawn_row_ends_game() {
        let mut game = blocked_spawn_game();
        game.take_events();

        game.tick();

        assert!(game.is_game_over());
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.score, 0);
        assert_eq!(game.grid.total_filled_cells(), 3);
        assert!(game.take_events().contains(&GameEvent::GameOver));
    }

    #[test]
    fn no_mutation_after_game_over() {
        let mut game = blocked_spawn_game();
        game.tick();
        assert!(game.is_game_over());

        let positions = game.current.positions();
        let grid = game.grid.clone();
        game.take_events();

        game.handle_input(Intent::MoveLeft);
        game.handle_input(Intent::MoveRight);
        game.handle_input(Intent::Rotate);
        game.handle_input(Intent::TogglePause);
        game.handle_input(Intent::SoftDrop(true));
        game.tick();
        game.check_tetromino_landed();

        assert_eq!(game.current.positions(), positions);
        assert_eq!(game.grid, grid);
        assert_eq!(game.score, 0);
        assert!(!game.paused);
        assert!(!game.timer.is_soft_drop());
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn piece_stuck_above_field_ends_game() {
        let settings = Settings::default();
        let mut grid = empty_grid(&settings);
        grid.place(filler(5, 2));

        // L reaches up to row -1 when its reference block sits on row 1.
        let mut game = Game::with_grid(&settings, grid, piece_at(Shape::L, 5, 1));
        game.tick();

        assert!(game.is_game_over());
        assert_eq!(game.grid.total_filled_cells(), 1);
    }

    #[test]
    fn overlapping_spawn_is_not_top_out_until_landing() {
        // Only the row the piece lands on is checked, so a spawn that overlaps
        // a landed block keeps falling.
        let settings = Settings::default();
        let mut grid = empty_grid(&settings);
        grid.place(filler(6, 0));

        let mut game = Game::with_grid(&settings, grid, piece_at(Shape::T, 5, 0));
        game.tick();

        assert!(!game.is_game_over());
        assert_eq!(game.current.reference(), Position::new(5, 1));
    }

    #[test]
    fn restart_clears_game_over() {
        let mut game = blocked_spawn_game();
        game.tick();
        assert!(game.is_game_over());

        game.restart();

        assert!(!game.is_game_over());
        assert_eq!(game.score, 0);
        assert_eq!(game.lines_cleared, 0);
        assert_eq!(game.grid.total_filled_cells(), 0);
        assert!(game.current.is_current);
        assert_eq!(game.current.reference(), game.spawn_position());
        assert_eq!(game.take_events(), vec![GameEvent::GameRestarted]);
    }
}

// ============================================================================
// Input Tests
// ============================================================================

mod input {
    use super::*;

    #[test]
    fn move_intents_shift_current_piece() {
        let mut game = sequence_game(vec![Shape::T]);
        let start = game.current.reference();
        game.take_events();

        game.handle_input(Intent::MoveLeft);
        assert_eq!(game.current.reference(), start.offset(-1, 0));

        game.handle_input(Intent::MoveRight);
        game.handle_input(Intent::MoveRight);
        assert_eq!(game.current.reference(), start.offset(1, 0));

        let events = game.take_events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| *e == GameEvent::PieceMoved));
    }

    #[test]
    fn rotate_intent_emits_event() {
        let mut game = sequence_game(vec![Shape::T]);
        game.take_events();

        game.handle_input(Intent::Rotate);

        assert_eq!(game.take_events(), vec![GameEvent::PieceRotated]);
    }

    #[test]
    fn rejected_move_emits_nothing() {
        let settings = Settings::default();
        let mut game =
            Game::with_grid(&settings, empty_grid(&settings), piece_at(Shape::T, 1, 5));
        game.take_events();

        game.handle_input(Intent::MoveLeft);

        assert_eq!(game.current.reference(), Position::new(1, 5));
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn pause_blocks_movement_and_ticks() {
        let mut game = sequence_game(vec![Shape::T]);
        let start = game.current.positions();

        game.handle_input(Intent::TogglePause);
        assert!(game.paused);
        assert_eq!(game.state(), GameState::Paused);

        game.handle_input(Intent::MoveLeft);
        game.handle_input(Intent::Rotate);
        game.tick();
        assert_eq!(game.current.positions(), start);

        game.handle_input(Intent::TogglePause);
        assert_eq!(game.state(), GameState::Running);
        game.tick();
        assert_eq!(game.current.reference(), start[0].offset(0, 1));
    }

    #[test]
    fn pause_toggle_emits_events() {
        let mut game = sequence_game(vec![Shape::T]);
        game.take_events();

        game.toggle_pause();
        game.toggle_pause();

        assert_eq!(game.take_events(), vec![GameEvent::Paused, GameEvent::Unpaused]);
    }

    #[test]
    fn soft_drop_only_changes_interval() {
        let mut game = sequence_game(vec![Shape::T]);
        let start = game.current.positions();
        assert_eq!(game.fall_interval(), Duration::from_millis(200));

        game.handle_input(Intent::SoftDrop(true));
        assert_eq!(game.fall_interval(), Duration::from_millis(10));
        assert_eq!(game.current.positions(), start);

        game.handle_input(Intent::SoftDrop(false));
        assert_eq!(game.fall_interval(), Duration::from_millis(200));
    }
}

// ============================================================================
// Render Grid Consistency Tests
// ============================================================================

mod render_consistency {
    use super::*;

    #[test]
    fn render_grid_includes_current_piece() {
        let settings = Settings::default();
        let game = Game::with_grid(&settings, empty_grid(&settings), piece_at(Shape::O, 4, 6));

        let visual = game.render_grid();

        // O at (4,6) covers (4,6), (4,5), (5,6), (5,5)
        assert_eq!(visual[6][4], CellState::Filled(Shape::O));
        assert_eq!(visual[5][4], CellState::Filled(Shape::O));
        assert_eq!(visual[6][5], CellState::Filled(Shape::O));
        assert_eq!(visual[5][5], CellState::Filled(Shape::O));
    }

    #[test]
    fn render_grid_skips_cells_above_field() {
        let settings = Settings::default();
        let game = Game::with_grid(&settings, empty_grid(&settings), piece_at(Shape::I, 5, 0));

        let visual = game.render_grid();

        let drawn = visual.iter().flatten().filter(|c| **c != CellState::Empty).count();
        assert_eq!(drawn, 2);
    }

    #[test]
    fn render_grid_includes_landed_blocks() {
        let settings = Settings::default();
        let mut grid = empty_grid(&settings);
        grid.place(filler(0, 19));

        let game = Game::with_grid(&settings, grid, piece_at(Shape::O, 4, 6));

        assert_eq!(game.render_grid()[19][0], CellState::Filled(Shape::T));
    }
}

// ============================================================================
// Piece Provider Tests
// ============================================================================

mod piece_provider {
    use super::*;

    #[test]
    fn sequence_provider_cycles() {
        let mut provider = SequencePieceProvider::new(vec![Shape::I, Shape::O]);

        assert_eq!(provider.next_piece(), Shape::I);
        assert_eq!(provider.next_piece(), Shape::O);
        assert_eq!(provider.next_piece(), Shape::I);
    }

    #[test]
    fn game_draws_current_then_next() {
        let game = sequence_game(vec![Shape::J, Shape::L, Shape::S]);

        assert_eq!(game.current.shape, Shape::J);
        assert_eq!(game.next.shape, Shape::L);
        assert_eq!(game.next.reference(), game.spawn_position());
    }

    #[test]
    fn seeded_provider_is_repeatable() {
        let mut a = RandomPieceProvider::seeded(42);
        let mut b = RandomPieceProvider::seeded(42);

        let first: Vec<Shape> = (0..32).map(|_| a.next_piece()).collect();
        let second: Vec<Shape> = (0..32).map(|_| b.next_piece()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn prepared_grids_promote_the_same_pieces() {
        let settings = Settings::default();
        let mut a = Game::with_grid(&settings, empty_grid(&settings), piece_at(Shape::O, 4, 0));
        let mut b = Game::with_grid(&settings, empty_grid(&settings), piece_at(Shape::O, 4, 0));

        tick_until_score_changes(&mut a);
        tick_until_score_changes(&mut b);

        assert_eq!(a.current.shape, b.current.shape);
        assert_eq!(a.next.shape, b.next.shape);
        assert_eq!(a.current.positions(), b.current.positions());
    }

    #[test]
    fn seeded_games_deal_the_same_pieces() {
        let settings = Settings {
            seed: Some(7),
            ..Settings::default()
        };
        let a = Game::new(&settings);
        let b = Game::new(&settings);

        assert_eq!(a.current.shape, b.current.shape);
        assert_eq!(a.next.shape, b.next.shape);
    }
}
