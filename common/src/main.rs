use minesweeper_agent::*;
use std::thread;
use std::time::Duration;

fn main() {
    // --- 1. Initialization ---
    let mut session = Session::new(10, 10, 15);

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: play cells proven safe by inference, guess randomly otherwise.");
    println!("Initial Board:");
    print_board(&session);
    thread::sleep(Duration::from_secs(2));

    // --- 2. Game Loop ---
    let mut move_count = 0;
    while session.game.game_state == GameState::Playing {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        // --- 3. One Bot Turn ---
        match session.advance() {
            Ok(MoveOutcome::Safe(point, count)) => {
                println!("Logic found a guaranteed safe cell.");
                println!(
                    "Bot reveals ({}, {}): {} nearby mines.",
                    point.x, point.y, count
                );
            }
            Ok(MoveOutcome::Guess(point, count)) => {
                println!("No provably safe move. Making a random guess...");
                println!(
                    "Bot reveals ({}, {}): {} nearby mines.",
                    point.x, point.y, count
                );
            }
            Ok(MoveOutcome::Exploded(point)) => {
                println!("Bot guessed ({}, {}) and hit a mine.", point.x, point.y);
            }
            Ok(MoveOutcome::Exhausted) => {
                println!("Every remaining cell is a proven mine. Flagging them all.");
            }
            Err(e) => {
                // The agent rejected the reported move. This indicates a bug
                // rather than a playable condition, so stop here.
                println!("Agent rejected the move: {}", e);
                break;
            }
        }

        print_board(&session);

        // Add a delay to make the game watchable
        thread::sleep(Duration::from_millis(500));
    }

    // --- 4. Final Result ---
    println!("\n--- Game Over ---");
    println!(
        "Mines found by inference: {} of {}.",
        session.game.flagged.len(),
        session.game.total_mines()
    );

    match session.game.game_state {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
}

fn print_board(session: &Session) {
    let game = &session.game;
    let agent = &session.agent;

    // Print header
    print!("   ");
    for x in 0..game.width {
        print!("{:^3}", x);
    }
    println!("\n  +{}", "---".repeat(game.width));

    // Print rows
    for y in 0..game.height {
        print!("{:^2}|", y);
        for x in 0..game.width {
            let point = Point { x, y };
            let display = if game.flagged.contains(&point) {
                " ⚑ ".to_string()
            } else if agent.moves_made().contains(&point) {
                format!(" {} ", game.nearby_mines(point))
            } else {
                " ■ ".to_string()
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
