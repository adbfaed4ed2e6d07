pub mod url_entry;
pub mod video_entry;
