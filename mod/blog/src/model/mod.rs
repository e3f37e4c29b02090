mod user;
mod follow;
mod post;
mod comment;
mod music;
mod session;
mod feed;
mod viewer;

pub use user::*;
pub use follow::*;
pub use post::*;
pub use comment::*;
pub use music::*;
pub use session::*;
pub use feed::*;
pub use viewer::*;
