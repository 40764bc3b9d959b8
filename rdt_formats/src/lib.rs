pub mod bytes;
pub mod game;
pub mod room;
pub mod text;

pub use game::{Generation, SectionKind};
pub use room::{RoomBuilder, RoomImage, SectionInfo};
pub use text::{NoText, TextSource};
