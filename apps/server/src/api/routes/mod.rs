pub mod candidates;

pub use candidates::candidate_routes;
