/// Presentation layer: everything here only reads `AppState` / `ViewModel`
/// and forwards user input back to `AppState`.
pub mod panels;
pub mod plot;
pub mod summary;
