use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::WireError;

use super::types::{
    msg_type, LatencyStats, PercentileCi, Reply, ReportKind, Request, ThroughputStats,
    PERCENTILE_COUNT,
};

pub const HEADER_BYTES: usize = 8;
pub const THROUGHPUT_STATS_BYTES: usize = 40;
pub const LATENCY_STATS_BYTES: usize = THROUGHPUT_STATS_BYTES + 8 + PERCENTILE_COUNT * 24 + 6;
/// Upper bound on any payload this protocol defines; larger frames are garbage.
pub const MAX_PAYLOAD_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_type: u32,
    pub length: u32,
}

pub fn decode_header(bytes: &[u8; HEADER_BYTES]) -> Header {
    Header {
        msg_type: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    }
}

fn put_header(buf: &mut Vec<u8>, msg_type: u32, length: u32) {
    buf.extend_from_slice(&msg_type.to_le_bytes());
    buf.extend_from_slice(&length.to_le_bytes());
}

fn put_throughput(buf: &mut Vec<u8>, stats: &ThroughputStats) {
    buf.extend_from_slice(&stats.rx_bytes.to_le_bytes());
    buf.extend_from_slice(&stats.tx_bytes.to_le_bytes());
    buf.extend_from_slice(&stats.req_count.to_le_bytes());
    buf.extend_from_slice(&stats.duration.to_le_bytes());
    buf.extend_from_slice(&stats.correct_iad.to_le_bytes());
}

fn put_latency(buf: &mut Vec<u8>, stats: &LatencyStats) {
    put_throughput(buf, &stats.throughput);
    buf.extend_from_slice(&stats.avg_lat.to_le_bytes());
    for percentile in &stats.percentiles {
        buf.extend_from_slice(&percentile.low.to_le_bytes());
        buf.extend_from_slice(&percentile.value.to_le_bytes());
        buf.extend_from_slice(&percentile.high.to_le_bytes());
    }
    buf.extend_from_slice(&stats.to_reduce_sampling.to_le_bytes());
    buf.push(stats.is_iid.min(1) as u8);
    buf.push(stats.is_stationary.min(1) as u8);
}

pub fn encode_request(request: &Request) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_BYTES + 12);
    match request {
        Request::ConnOpen => {
            put_header(&mut buf, msg_type::CONN_OPEN, 4);
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
        Request::StartLoad { rps } => {
            put_header(&mut buf, msg_type::START_LOAD, 4);
            buf.extend_from_slice(&rps.to_le_bytes());
        }
        Request::StartMeasure { samples, rate } => {
            put_header(&mut buf, msg_type::START_MEASURE, 12);
            buf.extend_from_slice(&samples.to_le_bytes());
            buf.extend_from_slice(&rate.to_le_bytes());
        }
        Request::ReportReq { kind } => {
            put_header(&mut buf, msg_type::REPORT_REQ, 4);
            buf.extend_from_slice(&(*kind as u32).to_le_bytes());
        }
    }
    buf
}

pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_BYTES + LATENCY_STATS_BYTES);
    match reply {
        Reply::Ack(value) => {
            put_header(&mut buf, msg_type::REPLY_ACK, 4);
            buf.extend_from_slice(&value.to_le_bytes());
        }
        Reply::Value(value) => {
            put_header(&mut buf, msg_type::REPLY_VALUE, 4);
            buf.extend_from_slice(&value.to_le_bytes());
        }
        Reply::Throughput(stats) => {
            put_header(
                &mut buf,
                msg_type::REPLY_STATS_THROUGHPUT,
                THROUGHPUT_STATS_BYTES as u32,
            );
            put_throughput(&mut buf, stats);
        }
        Reply::Latency(stats) => {
            put_header(
                &mut buf,
                msg_type::REPLY_STATS_LATENCY,
                LATENCY_STATS_BYTES as u32,
            );
            put_latency(&mut buf, stats);
        }
        Reply::Convergence(value) => {
            put_header(&mut buf, msg_type::REPLY_CONVERGENCE, 4);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
    buf
}

fn expected_payload_len(msg_type_value: u32) -> Result<usize, WireError> {
    match msg_type_value {
        msg_type::START_MEASURE => Ok(12),
        msg_type::REPLY_STATS_THROUGHPUT => Ok(THROUGHPUT_STATS_BYTES),
        msg_type::REPLY_STATS_LATENCY => Ok(LATENCY_STATS_BYTES),
        msg_type::CONN_OPEN
        | msg_type::START_LOAD
        | msg_type::REPORT_REQ
        | msg_type::REPLY_ACK
        | msg_type::REPLY_VALUE
        | msg_type::REPLY_CONVERGENCE => Ok(4),
        other => Err(WireError::UnknownMessageType { msg_type: other }),
    }
}

fn check_length(header: &Header, payload: &[u8]) -> Result<(), WireError> {
    let expected = expected_payload_len(header.msg_type)?;
    if header.length as usize != expected || payload.len() != expected {
        return Err(WireError::LengthMismatch {
            msg_type: header.msg_type,
            length: header.length,
        });
    }
    Ok(())
}

fn read_u32(cursor: &mut Cursor<&[u8]>, context: &'static str) -> Result<u32, WireError> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|err| WireError::Truncated {
            context,
            source: err,
        })
}

fn read_throughput(
    cursor: &mut Cursor<&[u8]>,
    context: &'static str,
) -> Result<ThroughputStats, WireError> {
    let truncated = |err| WireError::Truncated {
        context,
        source: err,
    };
    Ok(ThroughputStats {
        rx_bytes: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
        tx_bytes: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
        req_count: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
        duration: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
        correct_iad: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
    })
}

fn read_latency(cursor: &mut Cursor<&[u8]>) -> Result<LatencyStats, WireError> {
    let context = "latency record";
    let truncated = |err| WireError::Truncated {
        context,
        source: err,
    };
    let throughput = read_throughput(cursor, context)?;
    let avg_lat = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
    let mut percentiles = [PercentileCi::default(); PERCENTILE_COUNT];
    for percentile in &mut percentiles {
        percentile.low = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
        percentile.value = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
        percentile.high = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
    }
    let to_reduce_sampling = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
    let is_iid = cursor.read_u8().map_err(truncated)?;
    let is_stationary = cursor.read_u8().map_err(truncated)?;
    Ok(LatencyStats {
        throughput,
        avg_lat,
        percentiles,
        to_reduce_sampling,
        is_iid: u64::from(is_iid),
        is_stationary: u64::from(is_stationary),
    })
}

pub fn decode_request(header: &Header, payload: &[u8]) -> Result<Request, WireError> {
    check_length(header, payload)?;
    let mut cursor = Cursor::new(payload);
    match header.msg_type {
        msg_type::CONN_OPEN => {
            read_u32(&mut cursor, "conn-open payload")?;
            Ok(Request::ConnOpen)
        }
        msg_type::START_LOAD => Ok(Request::StartLoad {
            rps: read_u32(&mut cursor, "start-load payload")?,
        }),
        msg_type::START_MEASURE => {
            let samples = read_u32(&mut cursor, "start-measure payload")?;
            let rate = cursor
                .read_f64::<LittleEndian>()
                .map_err(|err| WireError::Truncated {
                    context: "start-measure payload",
                    source: err,
                })?;
            Ok(Request::StartMeasure { samples, rate })
        }
        msg_type::REPORT_REQ => {
            let kind = match read_u32(&mut cursor, "report-req payload")? {
                0 => ReportKind::Throughput,
                1 => ReportKind::Latency,
                other => return Err(WireError::UnknownReportKind { kind: other }),
            };
            Ok(Request::ReportReq { kind })
        }
        other => Err(WireError::UnknownMessageType { msg_type: other }),
    }
}

pub fn decode_reply(header: &Header, payload: &[u8]) -> Result<Reply, WireError> {
    check_length(header, payload)?;
    let mut cursor = Cursor::new(payload);
    match header.msg_type {
        msg_type::REPLY_ACK => Ok(Reply::Ack(read_u32(&mut cursor, "ack payload")?)),
        msg_type::REPLY_VALUE => Ok(Reply::Value(read_u32(&mut cursor, "value payload")?)),
        msg_type::REPLY_STATS_THROUGHPUT => Ok(Reply::Throughput(read_throughput(
            &mut cursor,
            "throughput record",
        )?)),
        msg_type::REPLY_STATS_LATENCY => Ok(Reply::Latency(read_latency(&mut cursor)?)),
        msg_type::REPLY_CONVERGENCE => Ok(Reply::Convergence(read_u32(
            &mut cursor,
            "convergence payload",
        )?)),
        other => Err(WireError::UnknownMessageType { msg_type: other }),
    }
}
