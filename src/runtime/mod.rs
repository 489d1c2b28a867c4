pub mod r#loop;
pub mod update;

pub use r#loop::ChatRuntime;
pub use update::UiUpdate;
