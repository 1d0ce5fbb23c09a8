//! `parley personas` — List the built-in personas.

use parley_agent::Persona;

pub fn run() {
    println!("🎭 Available personas:");
    println!();
    for persona in Persona::all() {
        println!("   {:<6} {}", persona.kind.to_string(), persona.summary);
        println!(
            "          model: {} (temperature {})",
            persona.default_model, persona.default_temperature
        );
        if persona.uses_book_search {
            println!("          needs: GOOGLE_API_KEY, PINECONE_API_KEY");
        } else {
            println!("          needs: GOOGLE_API_KEY");
        }
    }
    println!();
    println!("   Start one with: parley chat --persona <name>");
}
