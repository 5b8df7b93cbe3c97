use commonware_packet::{
    Error, FixedBytes, Reader, Serialize, Serializer, Snapshot, TrackChanges, Writer,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

#[derive(Default)]
struct Update {
    entity: u64,
    role: u8,
    position: [f32; 3],
    health: u16,
    payload: FixedBytes<256>,
}

impl Serialize for Update {
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<(), Error> {
        s.integer(&mut self.entity, "entity")?;
        s.bounded(&mut self.role, "role", 0, 5)?;
        for coordinate in self.position.iter_mut() {
            s.f32(coordinate, "position")?;
        }
        s.bounded(&mut self.health, "health", 0, 1000)?;
        s.object(&mut self.payload, "payload")
    }
}

fn sample() -> Update {
    Update {
        entity: 42,
        role: 3,
        position: [1.0, 2.0, 3.0],
        health: 900,
        payload: FixedBytes::new(&[7; 64]).unwrap(),
    }
}

fn bench_packet(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet");

    let mut update = sample();
    let mut buf = [0u8; 1200];
    group.bench_function("encode", |b| {
        b.iter(|| {
            let mut writer = Writer::new(&mut buf);
            update.serialize(&mut writer).unwrap();
            black_box(writer.finish().unwrap());
        });
    });

    let written = {
        let mut writer = Writer::new(&mut buf);
        update.serialize(&mut writer).unwrap();
        writer.finish().unwrap()
    };
    let mut decoded = Update::default();
    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut reader = Reader::new(&buf[..written]);
            decoded.serialize(&mut reader).unwrap();
            black_box(reader.finish().unwrap());
        });
    });

    let mut snapshot = Snapshot::new();
    let mut out = [0u8; 1200];
    group.bench_function("encode_unchanged_delta", |b| {
        b.iter(|| {
            let mut writer = TrackChanges::new(Writer::new(&mut out), &mut snapshot);
            update.serialize(&mut writer).unwrap();
            black_box(writer.into_inner().finish().unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_packet);
criterion_main!(benches);
