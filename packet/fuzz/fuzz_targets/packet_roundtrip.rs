#![no_main]

use arbitrary::Arbitrary;
use commonware_packet::{
    Error, FixedBytes, FixedString, Reader, Serialize, SerializeExt, Serializer, Snapshot,
    TrackChanges, TypeValidating, Writer,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug, Clone, Default, PartialEq)]
struct Fields {
    flag: bool,
    small: u8,
    medium: i32,
    large: u64,
    signed: i64,
    single: u32,
    double: u64,
    text: String,
    blob: Vec<u8>,
}

#[derive(Debug, Default, PartialEq)]
struct Packet {
    flag: bool,
    small: u8,
    medium: i32,
    large: u64,
    signed: i64,
    single: f32,
    double: f64,
    text: FixedString<64>,
    blob: FixedBytes<300>,
}

impl Packet {
    fn from_fields(fields: &Fields) -> Self {
        let mut text = fields.text.clone();
        while text.len() > 64 {
            text.pop();
        }
        let blob = &fields.blob[..fields.blob.len().min(300)];
        Self {
            flag: fields.flag,
            small: fields.small % 6,
            medium: fields.medium.clamp(-70_000, 70_000),
            large: fields.large,
            signed: fields.signed,
            single: f32::from_bits(fields.single),
            double: f64::from_bits(fields.double),
            text: FixedString::new(&text).unwrap(),
            blob: FixedBytes::new(blob).unwrap(),
        }
    }

    fn bits(&self) -> (u32, u64) {
        (self.single.to_bits(), self.double.to_bits())
    }
}

impl Serialize for Packet {
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<(), Error> {
        s.bool(&mut self.flag, "flag")?;
        s.bounded(&mut self.small, "small", 0, 5)?;
        s.bounded(&mut self.medium, "medium", -70_000, 70_000)?;
        s.integer(&mut self.large, "large")?;
        s.integer(&mut self.signed, "signed")?;
        s.f32(&mut self.single, "single")?;
        s.f64(&mut self.double, "double")?;
        s.object(&mut self.text, "text")?;
        s.object(&mut self.blob, "blob")
    }
}

#[derive(Arbitrary, Debug)]
enum FuzzInput {
    Roundtrip(Fields),
    Validated(Fields),
    Tracked(Fields, Fields),
    Decode(Vec<u8>),
    DecodeValidated(Vec<u8>),
}

fn same(a: &Packet, b: &Packet) {
    assert_eq!(a.flag, b.flag);
    assert_eq!(a.small, b.small);
    assert_eq!(a.medium, b.medium);
    assert_eq!(a.large, b.large);
    assert_eq!(a.signed, b.signed);
    assert_eq!(a.bits(), b.bits());
    assert_eq!(a.text, b.text);
    assert_eq!(a.blob, b.blob);
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::Roundtrip(fields) => {
            let mut packet = Packet::from_fields(&fields);
            let size = packet.encoded_size().expect("measure failed");
            let encoded = packet.encode(size).expect("encode failed");
            assert_eq!(encoded.len(), size);
            let decoded = Packet::decode(&encoded).expect("decode failed");
            same(&packet, &decoded);
        }
        FuzzInput::Validated(fields) => {
            let mut packet = Packet::from_fields(&fields);
            let mut buf = vec![0u8; 1024];
            let mut writer = TypeValidating::new(Writer::new(&mut buf));
            packet.serialize(&mut writer).expect("encode failed");
            let written = writer.into_inner().finish().expect("encode failed");

            let mut decoded = Packet::default();
            let mut reader = TypeValidating::new(Reader::new(&buf[..written]));
            decoded.serialize(&mut reader).expect("decode failed");
            same(&packet, &decoded);
        }
        FuzzInput::Tracked(first, second) => {
            let mut sent = Snapshot::new();
            let mut received = Snapshot::new();
            let mut receiver = Packet::default();
            for fields in [first, second] {
                let mut packet = Packet::from_fields(&fields);
                let mut buf = vec![0u8; 1024];
                let mut writer = TrackChanges::new(Writer::new(&mut buf), &mut sent);
                packet.serialize(&mut writer).expect("encode failed");
                let written = writer.into_inner().finish().expect("encode failed");

                let mut reader = TrackChanges::new(Reader::new(&buf[..written]), &mut received);
                receiver.serialize(&mut reader).expect("decode failed");
                same(&packet, &receiver);
            }
        }
        FuzzInput::Decode(bytes) => {
            if let Ok(packet) = Packet::decode(&bytes) {
                assert!(packet.small <= 5);
                assert!((-70_000..=70_000).contains(&packet.medium));
            }
        }
        FuzzInput::DecodeValidated(bytes) => {
            let mut packet = Packet::default();
            let mut reader = TypeValidating::new(Reader::new(&bytes));
            let _ = packet.serialize(&mut reader);
            assert!(reader.size() <= bytes.len());
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
