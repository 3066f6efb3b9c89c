use std::collections::BTreeMap;

use crate::args::CoordinatorArgs;

// Agent kinds understood by the agent binary's -a flag.
const KIND_THROUGHPUT: u32 = 0;
const KIND_LATENCY: u32 = 1;
const KIND_SYMMETRIC_NIC_TS: u32 = 2;
const KIND_SYMMETRIC_SW_TS: u32 = 3;

pub fn throughput_args(args: &CoordinatorArgs) -> String {
    format!(
        "-s {} -t {} -c {} -o {} -i {} -p {} -r {} -a {}",
        args.target_host,
        args.load_threads,
        args.load_conns,
        args.req_per_conn,
        args.idist,
        args.com_proto,
        args.app_proto,
        KIND_THROUGHPUT
    )
}

// Latency agents always run one outstanding request per connection.
pub fn latency_args(args: &CoordinatorArgs) -> String {
    format!(
        "-s {} -t {} -c {} -i {} -p {} -r {} -a {} -o 1",
        args.target_host,
        args.lt_threads,
        args.lt_conns,
        args.idist,
        args.com_proto,
        args.app_proto,
        KIND_LATENCY
    )
}

pub fn symmetric_args(args: &CoordinatorArgs) -> String {
    let prefix = format!(
        "-s {} -t {} -c {} -o {} -i {} -p {} -r {}",
        args.target_host,
        args.load_threads,
        args.load_conns,
        args.req_per_conn,
        args.idist,
        args.com_proto,
        args.app_proto
    );
    if args.nic_ts {
        format!("{} -a {} -n {}", prefix, KIND_SYMMETRIC_NIC_TS, args.if_name)
    } else {
        format!("{} -a {}", prefix, KIND_SYMMETRIC_SW_TS)
    }
}

/// Host-to-argument-string mapping for `--printAgentArgs`.
pub fn agent_args_map(args: &CoordinatorArgs) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for host in args.load_agent_hosts() {
        map.insert(host, throughput_args(args));
    }
    for host in args.lt_agent_hosts() {
        map.insert(host, latency_args(args));
    }
    for host in args.sym_agent_hosts() {
        map.insert(host, symmetric_args(args));
    }
    map
}
