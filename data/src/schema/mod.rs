pub mod weapons;
