use rand::Rng;

use sheetchat_types::protocol::SPIN_SYMBOLS;

/// Three random reels, e.g. `| ❤︎ | ☆︎ | ❤︎ |`.
pub fn slot_line<R: Rng>(rng: &mut R) -> String {
    let mut pick = || SPIN_SYMBOLS[rng.random_range(0..SPIN_SYMBOLS.len())];
    let (a, b, c) = (pick(), pick(), pick());
    format!("| {} | {} | {} |", a, b, c)
}
