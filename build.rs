use shadow_rs::ShadowBuilder;

fn main() {
    ShadowBuilder::builder()
        .build()
        .expect("generate shadow-rs build info");
}
