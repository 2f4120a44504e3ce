pub mod rooms;
pub mod thread;

pub use rooms::RoomDirectory;
pub use thread::ThreadResolver;
