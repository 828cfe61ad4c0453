mod quantizer;

pub use quantizer::Quantizer;
