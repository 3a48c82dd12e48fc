pub mod activities_api_service;
pub mod banner_service;
pub mod roster_service;
pub mod undo_service;
