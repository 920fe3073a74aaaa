use std::time::Duration;
use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt};

use pwmlink::{
    *,
    host::{Peer, Error},
    };


#[tokio::test]
async fn realigns_on_garbage() {
    let (near, mut far) = duplex(64);
    let (receive, transmit) = split(near);
    let peer = Peer::new(receive, transmit);

    let mut stream = [0x01, 0xAA, 0x13, 0, 0, 0, 0, 0];
    stream[3 ..].copy_from_slice(&Frame::new(-12, 45).encode());
    far.write_all(&stream).await.unwrap();

    let settings = peer.receive().await.unwrap();
    assert_eq!((settings.speed, settings.angle, settings.abs_speed), (-12, 45, 12));
    assert_eq!(peer.skipped(), 3);
}

#[tokio::test]
async fn times_out() {
    let (near, mut far) = duplex(64);
    let (receive, transmit) = split(near);
    let peer = Peer::new(receive, transmit).with_timeout(Duration::from_millis(20));
    far.write_all(&[0xAA, 0, 0, 0, 0]).await.unwrap();
    assert!(matches!(peer.receive().await, Err(Error::Timeout)));
}

#[tokio::test]
async fn frame_split_across_timeout() {
    let (near, mut far) = duplex(64);
    let (receive, transmit) = split(near);
    let peer = Peer::new(receive, transmit).with_timeout(Duration::from_millis(20));

    let bytes = Frame::new(33, -44).encode();
    far.write_all(&bytes[.. 3]).await.unwrap();
    assert!(matches!(peer.receive().await, Err(Error::Timeout)));

    far.write_all(&bytes[3 ..]).await.unwrap();
    let settings = peer.receive().await.unwrap();
    assert_eq!((settings.speed, settings.angle), (33, -44));
    assert_eq!(peer.skipped(), 0);
}

#[tokio::test]
async fn closed_stream() {
    let (near, far) = duplex(64);
    let (receive, transmit) = split(near);
    let peer = Peer::new(receive, transmit);
    drop(far);
    assert!(matches!(peer.receive().await, Err(Error::Bus(_))));
}

#[tokio::test]
async fn send_encodes() {
    let (near, mut far) = duplex(64);
    let (receive, transmit) = split(near);
    let peer = Peer::new(receive, transmit);
    peer.send(&MotionSettings::new(42, -30)).await.unwrap();
    let mut bytes = [0; FRAME_SIZE];
    far.read_exact(&mut bytes).await.unwrap();
    assert_eq!(bytes, [0xAA, 42, 0xE2, 0x82, 0x80]);
}

#[tokio::test]
async fn exchange_with_node() {
    let (near, mut far) = duplex(64);
    let (receive, transmit) = split(near);
    let peer = Peer::new(receive, transmit);
    far.write_all(&Frame::new(-5, 6).encode()).await.unwrap();
    let settings = peer.exchange(&MotionSettings::new(7, 8)).await.unwrap();
    assert_eq!((settings.speed, settings.angle), (-5, 6));
    let mut bytes = [0; FRAME_SIZE];
    far.read_exact(&mut bytes).await.unwrap();
    assert_eq!(Frame::decode(&bytes).unwrap().settings(), MotionSettings::new(7, 8));
}
