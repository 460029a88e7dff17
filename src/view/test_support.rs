use crate::view::filters::{PacketFilters, Protocol, TcpFlag};
use proptest::prelude::*;

fn text() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-zA-Z0-9.:=&, %+-]{0,12}")
}

prop_compose! {
    pub(crate) fn any_filters()(
        src_ip in text(),
        dst_ip in text(),
        src_port in text(),
        dst_port in text(),
        proto in proptest::option::of(prop_oneof![Just(Protocol::Tcp), Just(Protocol::Udp)]),
        flags in proptest::option::of(proptest::collection::btree_set(
            proptest::sample::select(TcpFlag::ALL.to_vec()), 0..6)),
        stream in text(),
        pair in any::<bool>(),
    ) -> PacketFilters {
        PacketFilters { src_ip, dst_ip, src_port, dst_port, proto, flags, stream, pair }
    }
}
