// Services module
// Contains the text-generation providers, the speech synthesis pipeline
// and artifact storage

pub mod storage;
pub mod story;
pub mod tts;
