pub(crate) mod frame_sizing_handler;
pub(crate) mod hit_test_handler;
pub(crate) mod snap_layout_handler;
