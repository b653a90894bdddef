pub(crate) mod blur;
pub(crate) mod canvas;
pub(crate) mod composite;
pub(crate) mod cpu;
pub(crate) mod params;
pub(crate) mod pipeline;
pub(crate) mod tile;
