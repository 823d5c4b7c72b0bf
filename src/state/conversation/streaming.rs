use crate::api::client::ByteStream;
use crate::api::stream::StreamParser;
use crate::types::StreamChunk;
use anyhow::Result;
use futures::{stream, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// Ordered, finite chunk sequence of one streaming call. Ends after the first error.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

struct ChunkState {
    bytes: ByteStream,
    parser: StreamParser,
    pending: VecDeque<StreamChunk>,
    finished: bool,
}

pub(super) fn chunk_stream(bytes: ByteStream) -> ChunkStream {
    let state = ChunkState {
        bytes,
        parser: StreamParser::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(bytes)) => match state.parser.process(&bytes) {
                    Ok(chunks) => state.pending.extend(chunks),
                    Err(error) => {
                        state.finished = true;
                        return Some((Err(error), state));
                    }
                },
                Some(Err(error)) => {
                    state.finished = true;
                    return Some((Err(error), state));
                }
                None => {
                    state.finished = true;
                    match state.parser.finish() {
                        Ok(chunks) => state.pending.extend(chunks),
                        Err(error) => return Some((Err(error), state)),
                    }
                }
            }
        }
    }))
}
