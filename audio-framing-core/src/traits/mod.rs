pub mod access_unit_source;
pub mod pcm_source;
