use dicemix_serialization::build_script;

fn main() {
    build_script::build_protobuf("protos", "protos");
}
