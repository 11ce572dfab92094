pub mod tournament;

pub use tournament::{tournament, TournamentSelection, TOURNAMENT_SIZE};
