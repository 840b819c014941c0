mod post_id;

pub use post_id::*;
