use super::*;

#[test]
fn test_new_buffer_is_empty() {
    let ring: RingBuffer<f32> = RingBuffer::new(4);
    assert_eq!(ring.read_space(), 0);
    assert_eq!(ring.write_space(), 4);
}

#[test]
fn test_write_then_read_round_trips_in_order() {
    let ring: RingBuffer<f32> = RingBuffer::new(8);
    let written = ring.write(&[1.0, 2.0, 3.0]);
    assert_eq!(written, 3);
    assert_eq!(ring.read_space(), 3);
    assert_eq!(ring.write_space(), 5);

    let mut out = [0.0f32; 3];
    let read = ring.read(&mut out);
    assert_eq!(read, 3);
    assert_eq!(out, [1.0, 2.0, 3.0]);
    assert_eq!(ring.read_space(), 0);
}

#[test]
fn test_write_stops_at_capacity() {
    let ring: RingBuffer<f32> = RingBuffer::new(4);
    let written = ring.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(written, 4);
    assert_eq!(ring.write_space(), 0);
}

#[test]
fn test_read_stops_at_available_data() {
    let ring: RingBuffer<f32> = RingBuffer::new(8);
    ring.write(&[1.0, 2.0]);
    let mut out = [9.0f32; 5];
    let read = ring.read(&mut out);
    assert_eq!(read, 2);
    assert_eq!(out, [1.0, 2.0, 9.0, 9.0, 9.0]);
}

#[test]
fn test_wraps_around_correctly() {
    let ring: RingBuffer<f32> = RingBuffer::new(4);
    ring.write(&[1.0, 2.0, 3.0]);
    let mut out = [0.0f32; 3];
    ring.read(&mut out);

    ring.write(&[4.0, 5.0, 6.0]);
    let mut out2 = [0.0f32; 3];
    let read = ring.read(&mut out2);
    assert_eq!(read, 3);
    assert_eq!(out2, [4.0, 5.0, 6.0]);
}

#[test]
fn test_clear_discards_buffered_samples() {
    let ring: RingBuffer<f32> = RingBuffer::new(8);
    ring.write(&[1.0, 2.0, 3.0]);
    ring.clear();
    assert_eq!(ring.read_space(), 0);
    assert_eq!(ring.write_space(), 8);
}

#[test]
fn test_integer_samples_work_too() {
    let ring: RingBuffer<i32> = RingBuffer::new(4);
    ring.write(&[10, 20]);
    let mut out = [0i32; 2];
    ring.read(&mut out);
    assert_eq!(out, [10, 20]);
}
