#![no_main]

use libfuzzer_sys::fuzz_target;
use icy_caff::caff_decode;
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
struct FuzzFrame {
    duration: i64,
    width: u8,
    height: u8,
    caption: String,
    tags: Vec<String>,
    pixels: Vec<u8>,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    frame_count: i64,
    year: i16,
    date: [u8; 4],
    creator: String,
    frames: Vec<FuzzFrame>,
}

fn block(data: &mut Vec<u8>, tag: u8, payload: &[u8]) {
    data.push(tag);
    data.extend_from_slice(&(payload.len() as i64).to_le_bytes());
    data.extend_from_slice(payload);
}

fuzz_target!(|input: FuzzInput| {
    let mut data = Vec::new();

    let mut header = b"CAFF".to_vec();
    header.extend_from_slice(&20i64.to_le_bytes());
    header.extend_from_slice(&input.frame_count.to_le_bytes());
    block(&mut data, 0x1, &header);

    let mut credits = input.year.to_le_bytes().to_vec();
    credits.extend_from_slice(&input.date);
    credits.extend_from_slice(&(input.creator.len() as i64).to_le_bytes());
    credits.extend_from_slice(input.creator.as_bytes());
    block(&mut data, 0x2, &credits);

    for frame in &input.frames {
        let (width, height) = (frame.width as i64, frame.height as i64);
        let content_length = width * height * 3;
        let header_length =
            36 + frame.caption.len() + 1 + frame.tags.iter().map(|t| t.len() + 1).sum::<usize>();

        let mut payload = frame.duration.to_le_bytes().to_vec();
        payload.extend_from_slice(b"CIFF");
        payload.extend_from_slice(&(header_length as i64).to_le_bytes());
        payload.extend_from_slice(&content_length.to_le_bytes());
        payload.extend_from_slice(&width.to_le_bytes());
        payload.extend_from_slice(&height.to_le_bytes());
        payload.extend_from_slice(frame.caption.as_bytes());
        payload.push(b'\n');
        for tag in &frame.tags {
            payload.extend_from_slice(tag.as_bytes());
            payload.push(0);
        }
        payload.extend(frame.pixels.iter().cycle().take(content_length as usize));
        block(&mut data, 0x3, &payload);
    }

    // Decode - should never panic
    let animation = match caff_decode(&data) {
        Ok(animation) => animation,
        Err(_) => return,
    };

    // A successful decode upholds the container invariants
    assert_eq!(animation.frames().len() as u64, animation.frame_count());
    for frame in animation.frames() {
        assert_eq!(frame.image().dimensions(), animation.dimensions());
        assert_eq!(
            frame.image().pixels().len() as u64,
            animation.width() * animation.height()
        );
    }
    assert_eq!(animation.captions().len(), animation.frames().len());
    assert_eq!(animation.tags().len(), animation.frames().len());
});
