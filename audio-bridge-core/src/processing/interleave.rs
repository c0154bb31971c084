/// Split an interleaved block into one linear buffer per channel.
///
/// `interleaved` is `[f0c0, f0c1, ..., f1c0, ...]` with `outputs.len()`
/// channels. Sample `i` lands in `outputs[i % channels][i / channels]`.
/// Frames beyond the shortest output buffer are dropped. A single channel is
/// copied straight across.
pub fn deinterleave(interleaved: &[f32], outputs: &mut [&mut [f32]]) {
    let channels = outputs.len();
    if channels == 0 {
        return;
    }

    if channels == 1 {
        let out = &mut outputs[0];
        let n = out.len().min(interleaved.len());
        out[..n].copy_from_slice(&interleaved[..n]);
        return;
    }

    for (frame_index, frame) in interleaved.chunks_exact(channels).enumerate() {
        for (out, &sample) in outputs.iter_mut().zip(frame) {
            if let Some(slot) = out.get_mut(frame_index) {
                *slot = sample;
            }
        }
    }
}
