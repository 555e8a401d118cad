//! Persisted FrameSeeker state.
//!
//! Messages are declared with `prost` derives directly so the crate builds
//! without a `protoc` toolchain. Field tags are part of the on-disk format
//! and must never be renumbered.

pub mod proto {
    /// Everything FrameSeeker remembers between runs.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SessionState {
        /// Last framerate the user picked, stored as typed (e.g. "29.97").
        #[prost(string, tag = "1")]
        pub selected_framerate: ::prost::alloc::string::String,
        /// Bookmark of the last loaded video, if any.
        #[prost(message, optional, tag = "2")]
        pub video_state: ::core::option::Option<VideoState>,
    }

    /// Identifies the last loaded file and where playback stopped.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct VideoState {
        #[prost(string, tag = "1")]
        pub name: ::prost::alloc::string::String,
        /// Milliseconds since the Unix epoch, as a decimal string. Empty when unknown.
        #[prost(string, tag = "2")]
        pub last_modified: ::prost::alloc::string::String,
        #[prost(double, tag = "3")]
        pub current_time: f64,
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::proto::{SessionState, VideoState};

    #[test]
    fn empty_buffer_decodes_to_default_state() {
        let state = SessionState::decode(&[][..]).unwrap();
        assert_eq!(state, SessionState::default());
        assert!(state.video_state.is_none());
    }

    #[test]
    fn video_state_survives_length_delimited_encoding() {
        let state = SessionState {
            selected_framerate: "25".to_string(),
            video_state: Some(VideoState {
                name: "clip.mp4".to_string(),
                last_modified: "1700000000000".to_string(),
                current_time: 12.5,
            }),
        };
        let mut buf = Vec::new();
        state.encode_length_delimited(&mut buf).unwrap();

        let decoded = SessionState::decode_length_delimited(buf.as_slice()).unwrap();
        assert_eq!(decoded, state);
    }
}
