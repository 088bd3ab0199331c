use bitstamp::core::config::ClientConfig;
use bitstamp::exchanges::bitstamp::build_client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Public endpoints work without credentials; BITSTAMP_API_KEY and
    // BITSTAMP_SECRET_KEY unlock the account calls below.
    let config = ClientConfig::from_env("BITSTAMP").unwrap_or_else(|_| ClientConfig::read_only());
    let authenticated = config.has_credentials();
    let client = build_client(config)?;

    println!("Fetching ticker...");
    match client.ticker("btcusd").await {
        Ok(ticker) => println!(
            "btcusd last {} bid {} ask {} (volume {})",
            ticker.last, ticker.bid, ticker.ask, ticker.volume
        ),
        Err(e) => println!("Error fetching ticker: {}", e),
    }

    println!("Fetching order book...");
    match client.order_book("btcusd", 1).await {
        Ok(book) => {
            for entry in book.bids.iter().take(5) {
                println!("bid {} x {}", entry.price, entry.amount);
            }
        }
        Err(e) => println!("Error fetching order book: {}", e),
    }

    if authenticated {
        println!("Fetching account balances...");
        match client.account_balances().await {
            Ok(balances) => {
                for balance in balances.iter().filter(|b| !b.total.is_zero()) {
                    println!(
                        "{}: {} available, {} reserved",
                        balance.currency, balance.available, balance.reserved
                    );
                }
            }
            Err(e) => println!("Error fetching balances: {}", e),
        }
    }

    Ok(())
}
