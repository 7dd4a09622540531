use minesweeper_agent as ms;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn create_game(size: u8, mines: u8) -> Vec<u8> {
    console_error_panic_hook::set_once();

    let session = ms::Session::new(size as usize, size as usize, mines as usize);
    session.serialize()
}

#[wasm_bindgen]
pub fn validate(bts: Vec<u8>) -> bool {
    console_error_panic_hook::set_once();

    let session = ms::Session::deserialize(&bts);
    session.game.won()
}

#[wasm_bindgen]
pub fn advance(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut session = ms::Session::deserialize(&bts);
    session.advance().map_err(|e| e.to_string())?;
    let mut xs = session.serialize();
    xs.push(match session.game.game_state {
        ms::GameState::Playing => 0,
        ms::GameState::Won => 1,
        ms::GameState::Lost => 2,
    });
    Ok(xs)
}

#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Vec<i8> {
    console_error_panic_hook::set_once();

    let session = ms::Session::deserialize(&bts);
    let game = &session.game;
    let agent = &session.agent;
    (0..game.height)
        .flat_map(|y| (0..game.width).map(move |x| ms::Point { x, y }))
        .map(|point| {
            if game.flagged.contains(&point) {
                -2
            } else if agent.moves_made().contains(&point) {
                game.nearby_mines(point) as i8
            } else {
                -1
            }
        })
        .collect()
}
