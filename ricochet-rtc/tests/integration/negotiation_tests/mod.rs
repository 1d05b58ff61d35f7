mod test_handshake;
mod test_protocol_violations;
