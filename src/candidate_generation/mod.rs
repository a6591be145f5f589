pub mod profile_snapshot;
