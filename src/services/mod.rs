pub mod audio;
pub mod gate;
pub mod keepalive;
pub mod sound;
